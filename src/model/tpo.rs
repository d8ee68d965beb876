//! True price origin: strip the bookmaker margin out of the quoted prices.

use crate::config::ModelConfig;
use crate::market::{OddsQuote, Outcome, OutcomeProbs};
use crate::numeric::finite_or;

/// De-margin the now quote into an estimate of the book's underlying
/// probabilities.
///
/// The overround is the amount by which summed implied probabilities exceed 1.
/// When the book shows no positive overround (thin or partial quotes) the
/// configured default margin is assumed instead. Each implied probability is
/// divided by `(1 + margin)`, floored at a small epsilon, and the triple is
/// renormalized to sum to 1.
pub fn true_price_origin(now: &OddsQuote, config: &ModelConfig) -> OutcomeProbs {
    let implied = now.implied();
    let overround = implied.sum() - 1.0;
    let margin = if overround > 0.0 {
        overround
    } else {
        config.default_margin.max(0.0)
    };

    let floor = config.prob_floor;
    let mut de_margined = [0.0; 3];
    for (i, o) in Outcome::ALL.iter().enumerate() {
        de_margined[i] = (finite_or(implied.get(*o), 0.0) / (1.0 + margin)).max(floor);
    }
    OutcomeProbs::new(de_margined[0], de_margined[1], de_margined[2]).normalized()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tpo_removes_overround() {
        let now = OddsQuote::new(1.95, 3.60, 3.80);
        let implied_sum = now.implied().sum();
        assert!(implied_sum > 1.02);

        let tpo = true_price_origin(&now, &ModelConfig::default());
        assert!((tpo.sum() - 1.0).abs() < 1e-9);
        // De-margining keeps the ordering: home stays the favorite.
        assert!(tpo.home > tpo.draw);
        assert!(tpo.home > tpo.away);
    }

    #[test]
    fn test_tpo_fair_book_uses_default_margin() {
        // Implied sum is exactly 1.0: no positive overround.
        let now = OddsQuote::new(2.0, 4.0, 4.0);
        let tpo = true_price_origin(&now, &ModelConfig::default());
        assert!((tpo.sum() - 1.0).abs() < 1e-9);
        assert!((tpo.home - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_tpo_missing_outcome_floored_not_zero() {
        let now = OddsQuote::new(1.50, 4.00, f64::NAN);
        let tpo = true_price_origin(&now, &ModelConfig::default());
        assert!(tpo.away > 0.0);
        assert!((tpo.sum() - 1.0).abs() < 1e-9);
    }
}
