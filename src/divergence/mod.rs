//! Divergence detector: conflict between Asian-Handicap movement and 1X2
//! movement, plus pairwise conflicts among the handicap lines themselves.

use serde::{Deserialize, Serialize};

use crate::market::{HandicapLine, OneXTwoMovement};

/// Shape of agreement among the handicap lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergencePattern {
    /// All lines carry identical directional labels
    Aligned,
    /// At least one pair of lines disagrees
    MultiPriceConflict,
}

/// Divergence measurements for one match.
#[derive(Debug, Clone, Serialize)]
pub struct DivergenceReport {
    /// |aggregate AH movement - aggregate 1X2 movement|
    pub score: f64,
    pub handicap_move: f64,
    pub one_x_two_move: f64,
    /// Number of line pairs with disagreeing directional labels
    pub conflicts: u32,
    pub pattern: DivergencePattern,
}

/// Measure divergence between markets and conflicts among lines.
pub fn detect(lines: &[HandicapLine], one_x_two: &OneXTwoMovement) -> DivergenceReport {
    let handicap_move: f64 = lines.iter().map(|l| l.abs_movement()).sum();
    let one_x_two_move = one_x_two.total_abs;

    let mut conflicts = 0u32;
    for i in 0..lines.len() {
        for j in (i + 1)..lines.len() {
            let a = &lines[i];
            let b = &lines[j];
            if a.direction_home != b.direction_home || a.direction_away != b.direction_away {
                conflicts += 1;
            }
        }
    }

    DivergenceReport {
        score: (handicap_move - one_x_two_move).abs(),
        handicap_move,
        one_x_two_move,
        conflicts,
        pattern: if conflicts == 0 {
            DivergencePattern::Aligned
        } else {
            DivergencePattern::MultiPriceConflict
        },
    }
}
