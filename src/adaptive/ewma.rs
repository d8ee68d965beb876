//! Exponentially weighted moving averages keyed by signal name.
//!
//! Each signal's smoothing factor is fixed at first creation from the per-key
//! configuration table (falling back to the global default) and never changes
//! afterwards. Updates are atomic read-modify-writes at the storage layer, and
//! every update also appends a raw sample record for future retraining.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::SignalsConfig;
use crate::numeric::clamp;
use crate::store::{RecordStore, StoreError};

const SIGNALS: &str = "signals";
const SAMPLES: &str = "signal_samples";

/// One named smoothed signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveSignal {
    pub key: String,
    pub value: f64,
    pub smoothing: f64,
    pub updated_at: DateTime<Utc>,
}

/// Store for named EWMA signals.
pub struct AdaptiveSignalStore {
    store: Option<Arc<dyn RecordStore>>,
    config: SignalsConfig,
}

impl AdaptiveSignalStore {
    pub fn new(store: Option<Arc<dyn RecordStore>>, config: SignalsConfig) -> Self {
        Self { store, config }
    }

    /// Smoothing factor for a key, clamped into `(0, 1]`.
    fn alpha_for(&self, key: &str) -> f64 {
        let alpha = self
            .config
            .alpha
            .get(key)
            .copied()
            .unwrap_or(self.config.default_alpha);
        clamp(alpha, 1e-6, 1.0)
    }

    /// Fetch the signal, persisting `fallback` with the configured smoothing
    /// on first access. Stateless (no persistence) when no store is present.
    pub fn get(&self, key: &str, fallback: f64) -> Result<AdaptiveSignal, StoreError> {
        let alpha = self.alpha_for(key);
        let Some(store) = &self.store else {
            return Ok(AdaptiveSignal {
                key: key.to_string(),
                value: fallback,
                smoothing: alpha,
                updated_at: Utc::now(),
            });
        };

        let initial = AdaptiveSignal {
            key: key.to_string(),
            value: fallback,
            smoothing: alpha,
            updated_at: Utc::now(),
        };
        let record = store.modify(SIGNALS, key, &mut |cur| match cur {
            Some(existing) => existing.clone(),
            None => serde_json::to_value(&initial).unwrap_or_else(|_| json!(null)),
        })?;
        Ok(serde_json::from_value(record)?)
    }

    /// Apply one EWMA step: `new = alpha * sample + (1 - alpha) * old`.
    ///
    /// NaN samples carry no signal and leave the stored value untouched. The
    /// raw sample is appended to an audit log the core never reads back.
    pub fn update(&self, key: &str, sample: f64) -> Result<AdaptiveSignal, StoreError> {
        if !sample.is_finite() {
            return self.get(key, self.config.default_value);
        }

        let default_alpha = self.alpha_for(key);
        let default_value = self.config.default_value;

        let Some(store) = &self.store else {
            // Stateless fallback: one EWMA step against the configured default.
            return Ok(AdaptiveSignal {
                key: key.to_string(),
                value: default_alpha * sample + (1.0 - default_alpha) * default_value,
                smoothing: default_alpha,
                updated_at: Utc::now(),
            });
        };

        let record = store.modify(SIGNALS, key, &mut |cur| {
            let (old_value, alpha) = match cur.and_then(|r| {
                serde_json::from_value::<AdaptiveSignal>(r.clone()).ok()
            }) {
                Some(sig) => (sig.value, clamp(sig.smoothing, 1e-6, 1.0)),
                None => (default_value, default_alpha),
            };
            let updated = AdaptiveSignal {
                key: key.to_string(),
                value: alpha * sample + (1.0 - alpha) * old_value,
                smoothing: alpha,
                updated_at: Utc::now(),
            };
            serde_json::to_value(&updated).unwrap_or_else(|_| json!(null))
        })?;
        let signal: AdaptiveSignal = serde_json::from_value(record)?;

        store.append(
            SAMPLES,
            json!({
                "key": key,
                "sample": sample,
                "at": signal.updated_at,
            }),
        )?;
        Ok(signal)
    }
}
