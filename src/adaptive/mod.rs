//! Adaptive state persisted across analyses: the EWMA signal store and the
//! pattern-outcome memory. Both degrade to stateless fallbacks when no record
//! store is configured.

mod ewma;
mod pattern;

pub use ewma::{AdaptiveSignal, AdaptiveSignalStore};
pub use pattern::{signature_hash, PatternMemory, PatternRecord, SignatureFeatures};
