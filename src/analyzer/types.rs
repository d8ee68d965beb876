//! Payload and result types for the analysis entry point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AnalyzeError;
use crate::classifier::SmartMoneyReport;
use crate::disparity::DisparityReport;
use crate::divergence::DivergenceReport;
use crate::market::{
    HandicapLine, OddsQuote, OneXTwoMovement, Outcome, OutcomeProbs, RawHandicapLine,
};

fn empty_quote() -> OddsQuote {
    OddsQuote::empty()
}

/// One match analysis request. Constructed fresh per request and never
/// mutated once derivation begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPayload {
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub league: String,
    #[serde(default)]
    pub kickoff_time: Option<DateTime<Utc>>,
    /// 1X2 quote at market open
    #[serde(default = "empty_quote")]
    pub open1: OddsQuote,
    /// Current 1X2 quote
    #[serde(default = "empty_quote")]
    pub now1: OddsQuote,
    #[serde(default)]
    pub handicap_lines: Vec<RawHandicapLine>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl MatchPayload {
    /// Parse a payload from loose JSON. Only a structurally invalid value
    /// (not an object, or missing the team fields) is an error; malformed
    /// numerics inside quotes degrade to NaN.
    pub fn from_value(value: serde_json::Value) -> Result<Self, AnalyzeError> {
        if !value.is_object() {
            return Err(AnalyzeError::InvalidPayload(
                "payload must be a JSON object".to_string(),
            ));
        }
        let payload: MatchPayload = serde_json::from_value(value)
            .map_err(|e| AnalyzeError::InvalidPayload(e.to_string()))?;
        payload.validate()?;
        Ok(payload)
    }

    pub fn validate(&self) -> Result<(), AnalyzeError> {
        if self.home_team.trim().is_empty() || self.away_team.trim().is_empty() {
            return Err(AnalyzeError::InvalidPayload(
                "home_team and away_team must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Stable key for audit records and outcome resolution.
    pub fn match_key(&self) -> String {
        let slug = |s: &str| s.trim().to_lowercase().replace(char::is_whitespace, "_");
        match self.kickoff_time {
            Some(t) => format!(
                "{}__{}__{}",
                slug(&self.home_team),
                slug(&self.away_team),
                t.format("%Y%m%d")
            ),
            None => format!("{}__{}", slug(&self.home_team), slug(&self.away_team)),
        }
    }
}

/// Final categorical read on the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalLabel {
    /// Informed money confirmed by stacking and sync
    SmartMoneyConfirmed,
    /// Loud but uncorroborated move
    TrapSuspected,
    /// Partial signals worth a lean
    PossibleMove,
    /// Default: nothing actionable
    UnclearWait,
}

/// What to do about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Back the predicted winner with the money
    Follow,
    /// Fade the recent move
    Fade,
    /// Small lean toward the predicted winner
    Lean,
    /// Stay out
    Wait,
}

/// Derived per-request metrics carried into the result for inspection.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsBundle {
    pub lines: Vec<HandicapLine>,
    pub one_x_two: OneXTwoMovement,
    /// Signed aggregate net flow across AH and 1X2 sides
    pub total_net_flow: f64,
    /// Raw (un-normalized) aggregate absolute movement
    pub raw_pressure: f64,
    pub hours_to_kickoff: Option<f64>,
    /// EWMA baselines read before this analysis updated them
    pub baselines: SignalBaselines,
}

/// Smoothed long-running baselines for the signals this analysis samples.
#[derive(Debug, Clone, Serialize, Default)]
pub struct SignalBaselines {
    pub net_flow: f64,
    pub juice_pressure: f64,
    pub divergence: f64,
}

/// Pattern-memory context attached to a result when the signature has been
/// seen before.
#[derive(Debug, Clone, Serialize)]
pub struct PatternSummary {
    pub occurrences: u64,
    pub win_rate: f64,
}

/// Structured output of one analysis. Transient; persisted only as part of
/// the match-case audit record.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub match_key: String,
    pub home_team: String,
    pub away_team: String,
    pub league: String,
    pub generated_at: DateTime<Utc>,

    pub predicted_winner: Option<Outcome>,
    pub confidence: f64,
    pub final_label: FinalLabel,
    pub recommendation: Recommendation,

    /// Normalized market implied probabilities from the now quote
    pub market_probs: OutcomeProbs,
    /// De-margined true price origin
    pub tpo: OutcomeProbs,
    /// Blended "true" distribution (simulation / TPO / market)
    pub true_probs: OutcomeProbs,
    /// Projected closing distribution
    pub projected_close: OutcomeProbs,

    pub disparity: DisparityReport,
    pub smart_money: SmartMoneyReport,
    pub divergence: DivergenceReport,
    pub metrics: MetricsBundle,
    pub pattern: Option<PatternSummary>,
}
