//! Configuration types for oddsflow
//!
//! Every numeric constant the pipeline blends with lives here as a named,
//! overridable value. The blend ratios and trap/sharp thresholds are
//! hand-tuned inheritances; they are deliberately configuration, not code.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub projector: ProjectorConfig,
    #[serde(default)]
    pub disparity: DisparityConfig,
    #[serde(default)]
    pub signals: SignalsConfig,
    #[serde(default)]
    pub confidence: ConfidenceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Probability model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Poisson simulation trial count (clamped to a sane range at use)
    #[serde(default = "default_sim_trials")]
    pub sim_trials: u32,

    /// Margin assumed when the book shows no positive overround
    #[serde(default = "default_margin")]
    pub default_margin: f64,

    /// Floor applied to de-margined probabilities before renormalization
    #[serde(default = "default_prob_floor")]
    pub prob_floor: f64,

    /// Expected goals per side for two evenly matched teams
    #[serde(default = "default_goals_base")]
    pub goals_base: f64,

    /// Goals added/removed per unit of log-strength
    #[serde(default = "default_strength_scale")]
    pub strength_scale: f64,

    /// Bounds on the per-side goal rate
    #[serde(default = "default_lambda_floor")]
    pub lambda_floor: f64,
    #[serde(default = "default_lambda_ceil")]
    pub lambda_ceil: f64,

    /// Fixed blend weights: simulated / TPO / raw market implied
    #[serde(default = "default_blend_sim")]
    pub blend_sim: f64,
    #[serde(default = "default_blend_tpo")]
    pub blend_tpo: f64,
    #[serde(default = "default_blend_market")]
    pub blend_market: f64,
}

fn default_sim_trials() -> u32 {
    800
}
fn default_margin() -> f64 {
    0.05
}
fn default_prob_floor() -> f64 {
    1e-4
}
fn default_goals_base() -> f64 {
    1.30
}
fn default_strength_scale() -> f64 {
    0.60
}
fn default_lambda_floor() -> f64 {
    0.05
}
fn default_lambda_ceil() -> f64 {
    3.80
}
fn default_blend_sim() -> f64 {
    0.60
}
fn default_blend_tpo() -> f64 {
    0.20
}
fn default_blend_market() -> f64 {
    0.20
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            sim_trials: default_sim_trials(),
            default_margin: default_margin(),
            prob_floor: default_prob_floor(),
            goals_base: default_goals_base(),
            strength_scale: default_strength_scale(),
            lambda_floor: default_lambda_floor(),
            lambda_ceil: default_lambda_ceil(),
            blend_sim: default_blend_sim(),
            blend_tpo: default_blend_tpo(),
            blend_market: default_blend_market(),
        }
    }
}

/// Smart-money classifier configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Positive weight on normalized price pressure ("juice")
    #[serde(default = "default_juice_weight")]
    pub juice_weight: f64,

    /// Positive weight on handicap-line stacking
    #[serde(default = "default_stacking_weight")]
    pub stacking_weight: f64,

    /// Positive weight on AH/1X2 directional synchronization
    #[serde(default = "default_sync_weight")]
    pub sync_weight: f64,

    /// Negative weight on AH-vs-1X2 divergence
    #[serde(default = "default_divergence_penalty")]
    pub divergence_penalty: f64,

    /// Aggregate absolute movement that maps to juice = 1.0
    #[serde(default = "default_juice_scale")]
    pub juice_scale: f64,

    /// Weight movement closer to kickoff more heavily
    #[serde(default = "default_true")]
    pub time_weighting: bool,

    /// Maximum extra weight applied right at kickoff
    #[serde(default = "default_time_weight_boost")]
    pub time_weight_boost: f64,

    /// Verdict thresholds
    #[serde(default = "default_smart_threshold")]
    pub smart_threshold: f64,
    #[serde(default = "default_mixed_threshold")]
    pub mixed_threshold: f64,

    /// Trap flag: elevated juice with low stacking
    #[serde(default = "default_trap_juice_min")]
    pub trap_juice_min: f64,
    #[serde(default = "default_trap_stack_max")]
    pub trap_stack_max: f64,

    /// Sharp flag: elevated juice with elevated stacking
    #[serde(default = "default_sharp_juice_min")]
    pub sharp_juice_min: f64,
    #[serde(default = "default_sharp_stack_min")]
    pub sharp_stack_min: f64,
}

fn default_juice_weight() -> f64 {
    0.50
}
fn default_stacking_weight() -> f64 {
    0.30
}
fn default_sync_weight() -> f64 {
    0.20
}
fn default_divergence_penalty() -> f64 {
    0.20
}
fn default_juice_scale() -> f64 {
    1.0
}
fn default_true() -> bool {
    true
}
fn default_time_weight_boost() -> f64 {
    0.50
}
fn default_smart_threshold() -> f64 {
    0.70
}
fn default_mixed_threshold() -> f64 {
    0.45
}
fn default_trap_juice_min() -> f64 {
    0.20
}
fn default_trap_stack_max() -> f64 {
    0.25
}
fn default_sharp_juice_min() -> f64 {
    0.20
}
fn default_sharp_stack_min() -> f64 {
    0.40
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            juice_weight: default_juice_weight(),
            stacking_weight: default_stacking_weight(),
            sync_weight: default_sync_weight(),
            divergence_penalty: default_divergence_penalty(),
            juice_scale: default_juice_scale(),
            time_weighting: true,
            time_weight_boost: default_time_weight_boost(),
            smart_threshold: default_smart_threshold(),
            mixed_threshold: default_mixed_threshold(),
            trap_juice_min: default_trap_juice_min(),
            trap_stack_max: default_trap_stack_max(),
            sharp_juice_min: default_sharp_juice_min(),
            sharp_stack_min: default_sharp_stack_min(),
        }
    }
}

/// Closing-edge projector configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectorConfig {
    /// Fraction of the gap closed toward TPO when sharp money is flagged
    #[serde(default = "default_sharp_fraction")]
    pub sharp_fraction: f64,

    /// Default drift fraction
    #[serde(default = "default_drift_fraction")]
    pub drift_fraction: f64,

    /// Mean-reversion fraction (negative) when a trap is flagged
    #[serde(default = "default_trap_fraction")]
    pub trap_fraction: f64,
}

fn default_sharp_fraction() -> f64 {
    0.60
}
fn default_drift_fraction() -> f64 {
    0.15
}
fn default_trap_fraction() -> f64 {
    -0.25
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            sharp_fraction: default_sharp_fraction(),
            drift_fraction: default_drift_fraction(),
            trap_fraction: default_trap_fraction(),
        }
    }
}

/// Disparity engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DisparityConfig {
    /// |delta| above which an outcome counts as more/less backed
    #[serde(default = "default_backed_threshold")]
    pub backed_threshold: f64,
}

fn default_backed_threshold() -> f64 {
    0.03
}

impl Default for DisparityConfig {
    fn default() -> Self {
        Self {
            backed_threshold: default_backed_threshold(),
        }
    }
}

/// EWMA signal store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SignalsConfig {
    /// Smoothing factor used when a key has no entry in the table
    #[serde(default = "default_alpha")]
    pub default_alpha: f64,

    /// Value assumed for a signal that has never been stored
    #[serde(default)]
    pub default_value: f64,

    /// Per-key smoothing factors, fixed at first creation of each signal
    #[serde(default)]
    pub alpha: HashMap<String, f64>,
}

fn default_alpha() -> f64 {
    0.20
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            default_alpha: default_alpha(),
            default_value: 0.0,
            alpha: HashMap::new(),
        }
    }
}

/// Final confidence blend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ConfidenceConfig {
    /// Weight on the classifier score
    #[serde(default = "default_score_weight")]
    pub score_weight: f64,

    /// Weight on the blended-probability margin
    #[serde(default = "default_margin_weight")]
    pub margin_weight: f64,

    /// Weight on the disparity magnitude
    #[serde(default = "default_disparity_weight")]
    pub disparity_weight: f64,

    /// Share of confidence taken from the pattern-memory win rate when a
    /// mature record exists
    #[serde(default = "default_pattern_weight")]
    pub pattern_weight: f64,

    /// Occurrences a pattern needs before its win rate is trusted
    #[serde(default = "default_pattern_min_occurrences")]
    pub pattern_min_occurrences: u64,
}

fn default_score_weight() -> f64 {
    0.50
}
fn default_margin_weight() -> f64 {
    0.30
}
fn default_disparity_weight() -> f64 {
    0.20
}
fn default_pattern_weight() -> f64 {
    0.30
}
fn default_pattern_min_occurrences() -> u64 {
    5
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            score_weight: default_score_weight(),
            margin_weight: default_margin_weight(),
            disparity_weight: default_disparity_weight(),
            pattern_weight: default_pattern_weight(),
            pattern_min_occurrences: default_pattern_min_occurrences(),
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Disable to run fully stateless
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Data directory for the JSON file store
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            data_dir: default_data_dir(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: crate::telemetry::LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: crate::telemetry::LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_fills_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.model.sim_trials, 800);
        assert_eq!(config.classifier.smart_threshold, 0.70);
        assert_eq!(config.projector.trap_fraction, -0.25);
        assert_eq!(config.signals.default_alpha, 0.20);
        assert!(config.storage.enabled);
    }

    #[test]
    fn test_partial_section_overrides() {
        let toml = r#"
            [model]
            sim_trials = 1500
            blend_sim = 0.5

            [classifier]
            smart_threshold = 0.75

            [signals]
            default_alpha = 0.10

            [signals.alpha]
            net_flow = 0.35

            [storage]
            enabled = false
            data_dir = "/tmp/oddsflow"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.model.sim_trials, 1500);
        assert_eq!(config.model.blend_sim, 0.5);
        // Untouched fields keep their defaults.
        assert_eq!(config.model.blend_tpo, 0.2);
        assert_eq!(config.classifier.smart_threshold, 0.75);
        assert_eq!(config.signals.alpha.get("net_flow"), Some(&0.35));
        assert!(!config.storage.enabled);
    }

    #[test]
    fn test_telemetry_format_parsed() {
        let config: Config = toml::from_str("[telemetry]\nlog_format = \"json\"\n").unwrap();
        assert_eq!(config.telemetry.log_format, crate::telemetry::LogFormat::Json);

        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.telemetry.log_format, crate::telemetry::LogFormat::Pretty);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }
}
