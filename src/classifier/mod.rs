//! Market-microstructure classifier: decides whether observed price movement
//! looks like informed ("smart") money or public noise / a trap.
//!
//! Four ingredients blend into a 0-1 score: price pressure ("juice"),
//! handicap-line stacking, AH/1X2 directional synchronization, and an
//! AH-vs-1X2 divergence penalty.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::ClassifierConfig;
use crate::market::{HandicapLine, OneXTwoMovement};
use crate::numeric::{clamp, Direction};
use crate::store::RecordStore;

const AUDIT: &str = "smart_moves";

/// Categorical verdict over the movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoneyVerdict {
    /// Confident informed-money read
    SmartMoney,
    /// Mixed signals, possibly a partial smart move
    MixedPublic,
    /// Public volume or deliberate trap pricing
    PublicOrTrap,
}

impl MoneyVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoneyVerdict::SmartMoney => "smart_money",
            MoneyVerdict::MixedPublic => "mixed_public",
            MoneyVerdict::PublicOrTrap => "public_or_trap",
        }
    }
}

/// Scored classification of one match's movement.
#[derive(Debug, Clone, Serialize)]
pub struct SmartMoneyReport {
    /// Blended confidence in `[0, 1]`
    pub score: f64,
    pub verdict: MoneyVerdict,
    /// Normalized price pressure
    pub juice: f64,
    /// Fraction of lines sharing the dominant directional bucket
    pub stacking: f64,
    /// Fraction of AH side directions agreeing with the 1X2 sides
    pub sync_ratio: f64,
    /// Normalized AH-vs-1X2 divergence (confidence reducer)
    pub divergence: f64,
    /// Elevated juice with low stacking: one loud line, likely bait
    pub trap: bool,
    /// Elevated juice with broad stacking: corroborated informed move
    pub sharp: bool,
}

/// The smart-money classifier.
pub struct SmartMoneyClassifier {
    config: ClassifierConfig,
    store: Option<Arc<dyn RecordStore>>,
}

impl SmartMoneyClassifier {
    pub fn new(config: ClassifierConfig, store: Option<Arc<dyn RecordStore>>) -> Self {
        Self { config, store }
    }

    /// Classify the movement and persist a scored audit record.
    pub fn classify(
        &self,
        match_key: &str,
        lines: &[HandicapLine],
        one_x_two: &OneXTwoMovement,
        hours_to_kickoff: Option<f64>,
    ) -> SmartMoneyReport {
        let ah_abs: f64 = lines.iter().map(|l| l.abs_movement()).sum();
        let raw_pressure = ah_abs + one_x_two.total_abs;

        let juice = clamp(
            raw_pressure * self.time_weight(hours_to_kickoff) / self.config.juice_scale,
            0.0,
            1.0,
        );
        let stacking = stacking_fraction(lines);
        let sync_ratio = sync_fraction(lines, one_x_two);
        let divergence = clamp(
            (ah_abs - one_x_two.total_abs).abs() / self.config.juice_scale,
            0.0,
            1.0,
        );

        let score = clamp(
            self.config.juice_weight * juice
                + self.config.stacking_weight * stacking
                + self.config.sync_weight * sync_ratio
                - self.config.divergence_penalty * divergence,
            0.0,
            1.0,
        );

        let verdict = if score >= self.config.smart_threshold {
            MoneyVerdict::SmartMoney
        } else if score >= self.config.mixed_threshold {
            MoneyVerdict::MixedPublic
        } else {
            MoneyVerdict::PublicOrTrap
        };

        let trap =
            juice > self.config.trap_juice_min && stacking < self.config.trap_stack_max;
        let sharp =
            juice > self.config.sharp_juice_min && stacking > self.config.sharp_stack_min;

        let report = SmartMoneyReport {
            score,
            verdict,
            juice,
            stacking,
            sync_ratio,
            divergence,
            trap,
            sharp,
        };

        if let Some(store) = &self.store {
            let audit = json!({
                "match_key": match_key,
                "score": report.score,
                "verdict": report.verdict,
                "juice": report.juice,
                "stacking": report.stacking,
                "sync_ratio": report.sync_ratio,
                "trap": report.trap,
                "sharp": report.sharp,
                "at": Utc::now(),
            });
            if let Err(e) = store.append(AUDIT, audit) {
                tracing::warn!(error = %e, match_key, "failed to persist smart-move audit");
            }
        }

        report
    }

    /// Movement closer to kickoff counts more; unknown kickoff means no boost.
    fn time_weight(&self, hours_to_kickoff: Option<f64>) -> f64 {
        if !self.config.time_weighting {
            return 1.0;
        }
        match hours_to_kickoff {
            Some(h) if h.is_finite() => {
                1.0 + self.config.time_weight_boost * clamp((24.0 - h) / 24.0, 0.0, 1.0)
            }
            _ => 1.0,
        }
    }
}

/// Fraction of lines whose home side moved with the dominant directional
/// bucket. Flat lines count against the fraction.
fn stacking_fraction(lines: &[HandicapLine]) -> f64 {
    if lines.is_empty() {
        return 0.0;
    }
    let mut down = 0usize;
    let mut up = 0usize;
    for line in lines {
        match line.direction_home {
            Direction::Down => down += 1,
            Direction::Up => up += 1,
            Direction::Flat => {}
        }
    }
    down.max(up) as f64 / lines.len() as f64
}

/// Fraction of AH side directions that agree with the matching 1X2 side.
fn sync_fraction(lines: &[HandicapLine], one_x_two: &OneXTwoMovement) -> f64 {
    if lines.is_empty() {
        return 0.0;
    }
    let mut agree = 0usize;
    for line in lines {
        if line.direction_home == one_x_two.direction_home {
            agree += 1;
        }
        if line.direction_away == one_x_two.direction_away {
            agree += 1;
        }
    }
    agree as f64 / (2 * lines.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{OddsQuote, RawHandicapLine};

    fn line(open_home: f64, now_home: f64, open_away: f64, now_away: f64) -> HandicapLine {
        HandicapLine::derive(&RawHandicapLine {
            label: "0".to_string(),
            open_home,
            open_away,
            now_home,
            now_away,
        })
    }

    fn classifier() -> SmartMoneyClassifier {
        SmartMoneyClassifier::new(ClassifierConfig::default(), None)
    }

    fn flat_market() -> OneXTwoMovement {
        let q = OddsQuote::new(2.10, 3.40, 3.10);
        OneXTwoMovement::derive(&q, &q)
    }

    #[test]
    fn test_no_movement_scores_zero() {
        let report = classifier().classify("m", &[], &flat_market(), None);
        assert_eq!(report.score, 0.0);
        assert_eq!(report.verdict, MoneyVerdict::PublicOrTrap);
        assert!(!report.trap);
        assert!(!report.sharp);
    }

    #[test]
    fn test_full_sync_contributes_full_weight() {
        // AH and 1X2 both move toward home.
        let lines = vec![line(1.90, 1.70, 1.90, 2.10)];
        let x2 = OneXTwoMovement::derive(
            &OddsQuote::new(2.10, 3.40, 3.10),
            &OddsQuote::new(1.95, 3.40, 3.40),
        );
        let report = classifier().classify("m", &lines, &x2, None);
        assert_eq!(report.sync_ratio, 1.0);
        // Sync is fully synced, so the sync term contributes exactly its weight.
        let cfg = ClassifierConfig::default();
        assert!(report.score >= cfg.sync_weight);
    }

    #[test]
    fn test_stacked_lines_raise_stacking() {
        let lines = vec![
            line(1.90, 1.75, 1.90, 2.05),
            line(1.85, 1.70, 1.95, 2.10),
            line(2.00, 1.85, 1.80, 1.95),
        ];
        let report = classifier().classify("m", &lines, &flat_market(), None);
        assert_eq!(report.stacking, 1.0);
    }

    #[test]
    fn test_trap_flag_on_loud_unstacked_move() {
        // Heavy juice concentrated in one side while the other lines sit flat.
        let lines = vec![
            line(1.90, 1.55, 1.90, 2.30),
            line(1.85, 1.85, 1.95, 1.95),
            line(2.00, 2.00, 1.80, 1.80),
            line(1.95, 1.95, 1.85, 1.85),
            line(2.05, 2.05, 1.75, 1.75),
        ];
        let report = classifier().classify("m", &lines, &flat_market(), None);
        assert!(report.juice > 0.2);
        // Flat lines stay in the denominator: 1 mover out of 5 lines.
        assert!((report.stacking - 0.2).abs() < 1e-12);
        assert!(report.stacking < 0.25);
        assert!(report.trap);
        assert!(!report.sharp);
    }

    #[test]
    fn test_sharp_flag_on_loud_stacked_move() {
        let lines = vec![
            line(1.90, 1.60, 1.90, 2.25),
            line(1.85, 1.60, 1.95, 2.25),
        ];
        let x2 = OneXTwoMovement::derive(
            &OddsQuote::new(2.10, 3.40, 3.10),
            &OddsQuote::new(1.90, 3.50, 3.60),
        );
        let report = classifier().classify("m", &lines, &x2, None);
        assert!(report.sharp);
        assert!(!report.trap);
        assert_ne!(report.verdict, MoneyVerdict::PublicOrTrap);
    }

    #[test]
    fn test_time_weighting_boosts_near_kickoff() {
        let lines = vec![line(1.90, 1.80, 1.90, 2.00)];
        let near = classifier().classify("m", &lines, &flat_market(), Some(1.0));
        let far = classifier().classify("m", &lines, &flat_market(), Some(72.0));
        assert!(near.juice > far.juice);
    }

    #[test]
    fn test_score_clamped_to_unit_interval() {
        let lines: Vec<HandicapLine> = (0..8)
            .map(|_| line(1.90, 1.40, 1.90, 2.60))
            .collect();
        let x2 = OneXTwoMovement::derive(
            &OddsQuote::new(2.50, 3.40, 2.80),
            &OddsQuote::new(1.80, 3.60, 4.20),
        );
        let report = classifier().classify("m", &lines, &x2, Some(0.5));
        assert!(report.score <= 1.0);
        assert!(report.score >= 0.0);
    }
}
