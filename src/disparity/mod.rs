//! Disparity engine: compares open-normalized vs now-normalized implied
//! probabilities across the three 1X2 outcomes.

use std::sync::Arc;

use chrono::Utc;
use serde::{Serialize, Serializer};
use serde_json::json;

use crate::config::DisparityConfig;
use crate::market::{OddsQuote, Outcome, OutcomeProbs};
use crate::store::RecordStore;

const AUDIT: &str = "disparity_audit";

/// Which outcome the repricing singled out, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisparityLabel {
    /// No delta beyond the threshold
    Neutral,
    /// The market now favors this outcome more than at open
    MoreBacked(Outcome),
    /// The market has drifted away from this outcome since open
    LessBacked(Outcome),
}

impl DisparityLabel {
    pub fn as_label(&self) -> String {
        match self {
            DisparityLabel::Neutral => "neutral".to_string(),
            DisparityLabel::MoreBacked(o) => format!("{}_more_backed", o.as_str()),
            DisparityLabel::LessBacked(o) => format!("{}_less_backed", o.as_str()),
        }
    }
}

impl Serialize for DisparityLabel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.as_label())
    }
}

/// Result of one open-vs-now comparison.
#[derive(Debug, Clone, Serialize)]
pub struct DisparityReport {
    /// Per-outcome `now_normalized - open_normalized`
    pub deltas: OutcomeProbs,
    /// Sum of absolute deltas
    pub magnitude: f64,
    pub label: DisparityLabel,
    pub open_normalized: OutcomeProbs,
    pub now_normalized: OutcomeProbs,
}

/// Stateless comparison plus an audit-record side effect.
pub struct DisparityEngine {
    config: DisparityConfig,
    store: Option<Arc<dyn RecordStore>>,
}

impl DisparityEngine {
    pub fn new(config: DisparityConfig, store: Option<Arc<dyn RecordStore>>) -> Self {
        Self { config, store }
    }

    /// Compare the open and now quotes and persist a disparity audit record.
    pub fn evaluate(&self, match_key: &str, open: &OddsQuote, now: &OddsQuote) -> DisparityReport {
        let open_normalized = open.implied().normalized();
        let now_normalized = now.implied().normalized();

        let deltas = OutcomeProbs::new(
            now_normalized.home - open_normalized.home,
            now_normalized.draw - open_normalized.draw,
            now_normalized.away - open_normalized.away,
        );
        let magnitude = deltas.home.abs() + deltas.draw.abs() + deltas.away.abs();

        let mut top = Outcome::Home;
        for o in [Outcome::Draw, Outcome::Away] {
            if deltas.get(o).abs() > deltas.get(top).abs() {
                top = o;
            }
        }
        let top_delta = deltas.get(top);
        let label = if top_delta > self.config.backed_threshold {
            DisparityLabel::MoreBacked(top)
        } else if top_delta < -self.config.backed_threshold {
            DisparityLabel::LessBacked(top)
        } else {
            DisparityLabel::Neutral
        };

        let report = DisparityReport {
            deltas,
            magnitude,
            label,
            open_normalized,
            now_normalized,
        };

        if let Some(store) = &self.store {
            let audit = json!({
                "match_key": match_key,
                "deltas": report.deltas,
                "magnitude": report.magnitude,
                "label": report.label,
                "at": Utc::now(),
            });
            if let Err(e) = store.append(AUDIT, audit) {
                tracing::warn!(error = %e, match_key, "failed to persist disparity audit");
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> DisparityEngine {
        DisparityEngine::new(DisparityConfig::default(), None)
    }

    #[test]
    fn test_normalized_vectors_sum_to_one() {
        let open = OddsQuote::new(2.10, 3.40, 3.10);
        let now = OddsQuote::new(1.95, 3.60, 3.80);
        let report = engine().evaluate("m", &open, &now);
        assert!((report.open_normalized.sum() - 1.0).abs() < 1e-9);
        assert!((report.now_normalized.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_identical_quotes_are_neutral() {
        let q = OddsQuote::new(2.10, 3.40, 3.10);
        let report = engine().evaluate("m", &q, &q);
        assert!(report.magnitude.abs() < 1e-12);
        assert_eq!(report.label, DisparityLabel::Neutral);
    }

    #[test]
    fn test_home_shortening_is_home_more_backed() {
        let open = OddsQuote::new(2.10, 3.40, 3.10);
        let now = OddsQuote::new(1.95, 3.60, 3.80);
        let report = engine().evaluate("m", &open, &now);
        assert_eq!(report.label, DisparityLabel::MoreBacked(Outcome::Home));
        assert!(report.deltas.home > 0.03);
        assert_eq!(report.label.as_label(), "home_more_backed");
    }

    #[test]
    fn test_home_drifting_is_home_less_backed() {
        let open = OddsQuote::new(1.95, 3.60, 3.80);
        let now = OddsQuote::new(2.30, 3.40, 3.10);
        let report = engine().evaluate("m", &open, &now);
        assert_eq!(report.label, DisparityLabel::LessBacked(Outcome::Home));
    }

    #[test]
    fn test_tiny_move_stays_neutral() {
        let open = OddsQuote::new(2.10, 3.40, 3.10);
        let now = OddsQuote::new(2.08, 3.42, 3.12);
        let report = engine().evaluate("m", &open, &now);
        assert_eq!(report.label, DisparityLabel::Neutral);
    }

    #[test]
    fn test_audit_record_appended() {
        use crate::store::{MemoryStore, QueryOrder};
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let engine = DisparityEngine::new(DisparityConfig::default(), Some(store.clone()));
        engine.evaluate(
            "key",
            &OddsQuote::new(2.10, 3.40, 3.10),
            &OddsQuote::new(1.95, 3.60, 3.80),
        );
        let rows = store.query(AUDIT, None, 10, QueryOrder::Newest).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["match_key"], "key");
    }
}
