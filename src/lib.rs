//! oddsflow: Pre-match betting market analyzer
//!
//! This library provides the core components for:
//! - Odds parsing and movement derivation (1X2 and Asian Handicap)
//! - Open-vs-now disparity labelling
//! - Smart-money classification (juice, stacking, sync, divergence)
//! - True-price-origin de-margining and Poisson match simulation
//! - Closing-line projection
//! - Adaptive EWMA signal baselines and pattern-outcome memory
//! - JSON file persistence with audit trails

pub mod adaptive;
pub mod analyzer;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod disparity;
pub mod divergence;
pub mod market;
pub mod model;
pub mod numeric;
pub mod projector;
pub mod store;
pub mod telemetry;
