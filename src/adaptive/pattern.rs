//! Pattern-outcome memory: win/loss statistics keyed by a canonical hash of a
//! feature tuple. Signatures recur across matches and the stored win rate
//! converges toward the empirical success probability of that combination.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::store::{Record, RecordStore, StoreError};

const PATTERNS: &str = "patterns";

/// Feature tuple for a signature. A BTreeMap keeps the encoding canonical:
/// semantically identical tuples hash identically regardless of the order
/// the features were inserted in.
pub type SignatureFeatures = BTreeMap<String, String>;

/// Canonical signature hash: sha256 over sorted `key=value|` pairs.
pub fn signature_hash(features: &SignatureFeatures) -> String {
    let mut hasher = Sha256::new();
    for (k, v) in features {
        hasher.update(k.as_bytes());
        hasher.update(b"=");
        hasher.update(v.as_bytes());
        hasher.update(b"|");
    }
    format!("{:x}", hasher.finalize())
}

/// Stored outcome statistics for one signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRecord {
    pub signature: String,
    pub occurrences: u64,
    pub win_rate: f64,
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Record,
}

/// Lookup/learn interface over the pattern collection.
pub struct PatternMemory {
    store: Option<Arc<dyn RecordStore>>,
}

impl PatternMemory {
    pub fn new(store: Option<Arc<dyn RecordStore>>) -> Self {
        Self { store }
    }

    /// Fetch the record for a feature tuple. Never creates; `None` both when
    /// the signature is unseen and when no store is configured.
    pub fn lookup(&self, features: &SignatureFeatures) -> Result<Option<PatternRecord>, StoreError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let hash = signature_hash(features);
        match store.get(PATTERNS, &hash)? {
            Some(record) => Ok(serde_json::from_value(record).ok()),
            None => Ok(None),
        }
    }

    /// Record one resolved outcome for a feature tuple.
    ///
    /// Inserts `count=1, win_rate ∈ {0, 1}` on first occurrence, otherwise
    /// applies the incremental running mean
    /// `new_rate = (old_rate * old_count + outcome) / new_count`.
    pub fn learn(
        &self,
        features: &SignatureFeatures,
        won: bool,
        metadata: Record,
    ) -> Result<PatternRecord, StoreError> {
        let hash = signature_hash(features);
        let outcome = if won { 1.0 } else { 0.0 };

        let Some(store) = &self.store else {
            // Stateless fallback: nothing is remembered.
            return Ok(PatternRecord {
                signature: hash,
                occurrences: 1,
                win_rate: outcome,
                last_seen: Utc::now(),
                metadata,
            });
        };

        let record = store.modify(PATTERNS, &hash, &mut |cur| {
            let updated = match cur
                .and_then(|r| serde_json::from_value::<PatternRecord>(r.clone()).ok())
            {
                Some(old) => {
                    let count = old.occurrences + 1;
                    PatternRecord {
                        signature: hash.clone(),
                        occurrences: count,
                        win_rate: (old.win_rate * old.occurrences as f64 + outcome)
                            / count as f64,
                        last_seen: Utc::now(),
                        metadata: metadata.clone(),
                    }
                }
                None => PatternRecord {
                    signature: hash.clone(),
                    occurrences: 1,
                    win_rate: outcome,
                    last_seen: Utc::now(),
                    metadata: metadata.clone(),
                },
            };
            serde_json::to_value(&updated).unwrap_or_else(|_| json!(null))
        })?;
        Ok(serde_json::from_value(record)?)
    }
}
