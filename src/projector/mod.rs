//! Closing-edge projector: extrapolate current market probabilities toward
//! (or away from) the true-price estimate depending on the classifier read.

use crate::classifier::SmartMoneyReport;
use crate::config::ProjectorConfig;
use crate::market::{Outcome, OutcomeProbs};

const PROB_FLOOR: f64 = 1e-4;

/// Fraction of the market-to-TPO gap expected to close by kickoff.
///
/// Sharp money continues (large positive fraction), the default is a small
/// drift, and a flagged trap mean-reverts (negative fraction).
pub fn projection_fraction(config: &ProjectorConfig, report: &SmartMoneyReport) -> f64 {
    if report.sharp {
        config.sharp_fraction
    } else if report.trap {
        config.trap_fraction
    } else {
        config.drift_fraction
    }
}

/// Project the closing distribution: `p' = p + f * (tpo - p)`, floored and
/// renormalized.
pub fn project_close(
    market: &OutcomeProbs,
    tpo: &OutcomeProbs,
    config: &ProjectorConfig,
    report: &SmartMoneyReport,
) -> OutcomeProbs {
    let f = projection_fraction(config, report);
    let mut projected = [0.0; 3];
    for (i, o) in Outcome::ALL.iter().enumerate() {
        let p = market.get(*o);
        projected[i] = (p + f * (tpo.get(*o) - p)).max(PROB_FLOOR);
    }
    OutcomeProbs::new(projected[0], projected[1], projected[2]).normalized()
}
