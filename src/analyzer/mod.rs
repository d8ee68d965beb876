//! Match orchestrator: composes the derived-metric chain, the probability
//! model and the adaptive stores into one `analyze` entry point.
//!
//! Failure at any derivation step degrades to "no signal" rather than
//! aborting; only a structurally invalid payload is an error. Persistence
//! failures are logged and never roll back an already-computed result.

mod types;

pub use types::{
    AnalysisResult, FinalLabel, MatchPayload, MetricsBundle, PatternSummary, Recommendation,
    SignalBaselines,
};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::adaptive::{AdaptiveSignalStore, PatternMemory, SignatureFeatures};
use crate::classifier::SmartMoneyClassifier;
use crate::config::Config;
use crate::disparity::DisparityEngine;
use crate::divergence;
use crate::market::{HandicapLine, OneXTwoMovement, Outcome, OutcomeProbs};
use crate::model::ProbabilityModel;
use crate::numeric::{clamp, finite_or};
use crate::projector;
use crate::store::{JsonFileStore, QueryOrder, Record, RecordStore, StoreError};

const MATCH_CASES: &str = "match_cases";
const MATCH_RESULTS: &str = "match_results";

/// Analysis errors surfaced to the caller.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The payload is not a well-formed structured object
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Outcome of resolving a stored match case against the real result.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionSummary {
    pub match_key: String,
    pub predicted: Option<Outcome>,
    pub actual: Outcome,
    pub won: bool,
    pub pattern_occurrences: u64,
    pub pattern_win_rate: f64,
}

/// The per-match analysis pipeline plus its adaptive state handles.
pub struct Analyzer {
    config: Config,
    store: Option<Arc<dyn RecordStore>>,
    signals: AdaptiveSignalStore,
    patterns: PatternMemory,
    disparity: DisparityEngine,
    classifier: SmartMoneyClassifier,
    model: ProbabilityModel,
}

impl Analyzer {
    /// Build an analyzer over an explicit store handle (or none, for fully
    /// stateless operation).
    pub fn new(config: Config, store: Option<Arc<dyn RecordStore>>) -> Self {
        Self {
            signals: AdaptiveSignalStore::new(store.clone(), config.signals.clone()),
            patterns: PatternMemory::new(store.clone()),
            disparity: DisparityEngine::new(config.disparity.clone(), store.clone()),
            classifier: SmartMoneyClassifier::new(config.classifier.clone(), store.clone()),
            model: ProbabilityModel::new(config.model.clone()),
            store,
            config,
        }
    }

    /// Build an analyzer with the file store from the configuration. A store
    /// that cannot be opened degrades to stateless operation with a warning.
    pub fn from_config(config: Config) -> Self {
        let store: Option<Arc<dyn RecordStore>> = if config.storage.enabled {
            match JsonFileStore::open(&config.storage.data_dir) {
                Ok(s) => Some(Arc::new(s)),
                Err(e) => {
                    tracing::warn!(error = %e, dir = ?config.storage.data_dir,
                        "could not open record store, running stateless");
                    None
                }
            }
        } else {
            None
        };
        Self::new(config, store)
    }

    /// Analyze one match payload.
    pub fn analyze(&self, payload: &MatchPayload) -> Result<AnalysisResult, AnalyzeError> {
        payload.validate()?;
        let match_key = payload.match_key();
        tracing::debug!(match_key, "starting analysis");

        let lines: Vec<HandicapLine> = payload
            .handicap_lines
            .iter()
            .map(HandicapLine::derive)
            .collect();
        let one_x_two = OneXTwoMovement::derive(&payload.open1, &payload.now1);
        let hours_to_kickoff = payload
            .kickoff_time
            .map(|t| (t - Utc::now()).num_seconds() as f64 / 3600.0);

        let disparity = self
            .disparity
            .evaluate(&match_key, &payload.open1, &payload.now1);
        let smart_money =
            self.classifier
                .classify(&match_key, &lines, &one_x_two, hours_to_kickoff);
        let estimate = self.model.estimate(&payload.now1);
        let divergence = divergence::detect(&lines, &one_x_two);
        let projected_close = if estimate.neutral_fallback {
            OutcomeProbs::neutral()
        } else {
            projector::project_close(
                &estimate.market,
                &estimate.tpo,
                &self.config.projector,
                &smart_money,
            )
        };

        let predicted_winner = if estimate.neutral_fallback {
            None
        } else {
            Some(estimate.blended.argmax())
        };

        let signature = self.signature_for(&disparity, &smart_money, predicted_winner);
        let pattern = match self.patterns.lookup(&signature) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, match_key, "pattern lookup failed");
                None
            }
        };

        let confidence = self.confidence(
            &smart_money,
            &estimate.blended,
            disparity.magnitude,
            pattern.as_ref().map(|p| (p.occurrences, p.win_rate)),
        );
        let (final_label, recommendation) =
            final_verdict(&smart_money, confidence, estimate.neutral_fallback);

        let total_net_flow = aggregate_net_flow(&lines, &one_x_two);
        let raw_pressure: f64 =
            lines.iter().map(|l| l.abs_movement()).sum::<f64>() + one_x_two.total_abs;

        let baselines = SignalBaselines {
            net_flow: self.signal_baseline("net_flow"),
            juice_pressure: self.signal_baseline("juice_pressure"),
            divergence: self.signal_baseline("divergence"),
        };

        let result = AnalysisResult {
            match_key: match_key.clone(),
            home_team: payload.home_team.clone(),
            away_team: payload.away_team.clone(),
            league: payload.league.clone(),
            generated_at: Utc::now(),
            predicted_winner,
            confidence,
            final_label,
            recommendation,
            market_probs: estimate.market,
            tpo: estimate.tpo,
            true_probs: estimate.blended,
            projected_close,
            disparity,
            smart_money,
            divergence,
            metrics: MetricsBundle {
                lines,
                one_x_two,
                total_net_flow,
                raw_pressure,
                hours_to_kickoff,
                baselines,
            },
            pattern: pattern.map(|p| PatternSummary {
                occurrences: p.occurrences,
                win_rate: p.win_rate,
            }),
        };

        self.update_signal("net_flow", total_net_flow);
        self.update_signal("juice_pressure", raw_pressure);
        self.update_signal("divergence", result.divergence.score);
        self.persist_case(payload, &result, &signature);

        tracing::info!(
            match_key,
            score = result.smart_money.score,
            verdict = result.smart_money.verdict.as_str(),
            label = ?result.final_label,
            confidence = result.confidence,
            "analysis complete"
        );
        Ok(result)
    }

    /// Feed a real result back into the pattern memory and audit trail.
    ///
    /// Returns `None` when no store is configured or no case is stored under
    /// the key.
    pub fn resolve(
        &self,
        match_key: &str,
        actual: Outcome,
    ) -> Result<Option<ResolutionSummary>, StoreError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let filter = |r: &Record| r["match_key"] == match_key;
        let cases = store.query(MATCH_CASES, Some(&filter), 1, QueryOrder::Newest)?;
        let Some(case) = cases.into_iter().next() else {
            return Ok(None);
        };

        let predicted: Option<Outcome> =
            serde_json::from_value(case["analysis"]["predicted_winner"].clone()).unwrap_or(None);
        let won = predicted == Some(actual);
        let features: SignatureFeatures =
            serde_json::from_value(case["signature"].clone()).unwrap_or_default();

        let pattern = self
            .patterns
            .learn(&features, won, json!({ "match_key": match_key }))?;
        store.append(
            MATCH_RESULTS,
            json!({
                "match_key": match_key,
                "actual": actual,
                "predicted": predicted,
                "won": won,
                "resolved_at": Utc::now(),
            }),
        )?;

        Ok(Some(ResolutionSummary {
            match_key: match_key.to_string(),
            predicted,
            actual,
            won,
            pattern_occurrences: pattern.occurrences,
            pattern_win_rate: pattern.win_rate,
        }))
    }

    /// Feature tuple identifying this movement shape in the pattern memory.
    fn signature_for(
        &self,
        disparity: &crate::disparity::DisparityReport,
        smart_money: &crate::classifier::SmartMoneyReport,
        predicted_winner: Option<Outcome>,
    ) -> SignatureFeatures {
        let cfg = &self.config.classifier;
        let stacking_bucket = if smart_money.stacking >= cfg.sharp_stack_min {
            "high"
        } else if smart_money.stacking > cfg.trap_stack_max {
            "mid"
        } else if smart_money.stacking > 0.0 {
            "low"
        } else {
            "none"
        };
        let mut features = BTreeMap::new();
        features.insert("disparity".to_string(), disparity.label.as_label());
        features.insert(
            "verdict".to_string(),
            smart_money.verdict.as_str().to_string(),
        );
        features.insert("stacking".to_string(), stacking_bucket.to_string());
        features.insert(
            "winner".to_string(),
            predicted_winner.map(|o| o.as_str()).unwrap_or("none").to_string(),
        );
        features
    }

    /// Blend classifier score, probability margin and disparity magnitude
    /// into a 0-1 confidence, then shade by pattern-memory history when a
    /// mature record exists.
    fn confidence(
        &self,
        smart_money: &crate::classifier::SmartMoneyReport,
        blended: &OutcomeProbs,
        disparity_magnitude: f64,
        pattern: Option<(u64, f64)>,
    ) -> f64 {
        let cfg = &self.config.confidence;
        let margin_term = clamp(blended.margin() * 2.0, 0.0, 1.0);
        let disparity_term = clamp(disparity_magnitude * 5.0, 0.0, 1.0);
        let mut confidence = cfg.score_weight * smart_money.score
            + cfg.margin_weight * margin_term
            + cfg.disparity_weight * disparity_term;

        if let Some((occurrences, win_rate)) = pattern {
            if occurrences >= cfg.pattern_min_occurrences {
                confidence =
                    (1.0 - cfg.pattern_weight) * confidence + cfg.pattern_weight * win_rate;
            }
        }
        clamp(confidence, 0.0, 1.0)
    }

    fn signal_baseline(&self, key: &str) -> f64 {
        match self.signals.get(key, self.config.signals.default_value) {
            Ok(sig) => sig.value,
            Err(e) => {
                tracing::warn!(error = %e, key, "signal read failed, using default");
                self.config.signals.default_value
            }
        }
    }

    fn update_signal(&self, key: &str, sample: f64) {
        if let Err(e) = self.signals.update(key, sample) {
            tracing::warn!(error = %e, key, "signal update failed");
        }
    }

    fn persist_case(
        &self,
        payload: &MatchPayload,
        result: &AnalysisResult,
        signature: &SignatureFeatures,
    ) {
        let Some(store) = &self.store else {
            return;
        };
        let case = json!({
            "id": Uuid::new_v4(),
            "match_key": result.match_key,
            "kickoff_time": payload.kickoff_time,
            "league": payload.league,
            "payload": payload,
            "analysis": result,
            "signature": signature,
            "outcome": null,
            "at": Utc::now(),
        });
        if let Err(e) = store.append(MATCH_CASES, case) {
            tracing::warn!(error = %e, match_key = result.match_key,
                "failed to persist match case");
        }
    }
}

/// Threshold rules for the final label and recommendation.
fn final_verdict(
    smart_money: &crate::classifier::SmartMoneyReport,
    confidence: f64,
    neutral_fallback: bool,
) -> (FinalLabel, Recommendation) {
    use crate::classifier::MoneyVerdict;

    if neutral_fallback {
        return (FinalLabel::UnclearWait, Recommendation::Wait);
    }
    if smart_money.trap {
        return (FinalLabel::TrapSuspected, Recommendation::Fade);
    }
    match smart_money.verdict {
        MoneyVerdict::SmartMoney => (FinalLabel::SmartMoneyConfirmed, Recommendation::Follow),
        MoneyVerdict::MixedPublic if confidence >= 0.5 => {
            (FinalLabel::PossibleMove, Recommendation::Lean)
        }
        _ => (FinalLabel::UnclearWait, Recommendation::Wait),
    }
}

/// Signed net flow summed over every quoted side, NaN sides excluded.
fn aggregate_net_flow(lines: &[HandicapLine], one_x_two: &OneXTwoMovement) -> f64 {
    let line_flow: f64 = lines
        .iter()
        .map(|l| finite_or(l.net_home, 0.0) + finite_or(l.net_away, 0.0))
        .sum();
    let x2_flow: f64 = Outcome::ALL
        .iter()
        .map(|o| finite_or(one_x_two.net.get(*o), 0.0))
        .sum();
    line_flow + x2_flow
}
