//! Odds parsing and small numeric helpers shared across the pipeline.
//!
//! Missing or malformed odds are represented as NaN and flow through every
//! downstream formula as "no signal" rather than aborting an analysis.

use serde::{Deserialize, Serialize};

/// Parse a raw odds string into a decimal price.
///
/// Trims whitespace and accepts a comma decimal separator. Returns NaN for
/// empty or non-numeric input; never panics.
pub fn parse_odds(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() || s == "-" {
        return f64::NAN;
    }
    s.replace(',', ".").parse::<f64>().unwrap_or(f64::NAN)
}

/// Clamp `v` into `[lo, hi]`.
pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

/// Implied probability of a decimal price: `1 / odds`.
///
/// NaN unless the price is finite and strictly positive.
pub fn implied_probability(odds: f64) -> f64 {
    if odds.is_finite() && odds > 0.0 {
        1.0 / odds
    } else {
        f64::NAN
    }
}

/// Net price flow between two snapshots: `open - now`.
///
/// Positive means the price shortened (money arrived on that side).
pub fn net_flow(open: f64, now: f64) -> f64 {
    if open.is_finite() && now.is_finite() {
        open - now
    } else {
        f64::NAN
    }
}

/// Replace a NaN/infinite value with a fallback.
pub fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}

/// Directional label of a price move between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Price shortened (now < open): money on this side.
    Down,
    /// Price drifted (now > open): money leaving this side.
    Up,
    /// No move, or either snapshot undefined.
    Flat,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Down => "down",
            Direction::Up => "up",
            Direction::Flat => "flat",
        }
    }
}

/// Directional label using strict comparison; `Flat` when either side is NaN.
pub fn direction(open: f64, now: f64) -> Direction {
    if !open.is_finite() || !now.is_finite() {
        return Direction::Flat;
    }
    if now < open {
        Direction::Down
    } else if now > open {
        Direction::Up
    } else {
        Direction::Flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_odds_plain() {
        assert_eq!(parse_odds("2.10"), 2.10);
        assert_eq!(parse_odds(" 3.40 "), 3.40);
        assert_eq!(parse_odds("14"), 14.0);
    }

    #[test]
    fn test_parse_odds_comma_separator() {
        assert_eq!(parse_odds("1,95"), 1.95);
    }

    #[test]
    fn test_parse_odds_garbage_is_nan() {
        assert!(parse_odds("").is_nan());
        assert!(parse_odds("   ").is_nan());
        assert!(parse_odds("-").is_nan());
        assert!(parse_odds("abc").is_nan());
    }

    #[test]
    fn test_implied_probability() {
        assert!((implied_probability(2.0) - 0.5).abs() < 1e-12);
        assert!(implied_probability(0.0).is_nan());
        assert!(implied_probability(-1.5).is_nan());
        assert!(implied_probability(f64::NAN).is_nan());
    }

    #[test]
    fn test_net_flow() {
        assert!((net_flow(2.10, 1.95) - 0.15).abs() < 1e-12);
        assert!(net_flow(f64::NAN, 1.95).is_nan());
        assert!(net_flow(2.10, f64::NAN).is_nan());
    }

    #[test]
    fn test_direction_strict() {
        assert_eq!(direction(2.10, 1.95), Direction::Down);
        assert_eq!(direction(1.95, 2.10), Direction::Up);
        assert_eq!(direction(2.0, 2.0), Direction::Flat);
        assert_eq!(direction(f64::NAN, 2.0), Direction::Flat);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(1.5, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-0.5, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.7, 0.0, 1.0), 0.7);
    }

    #[test]
    fn test_finite_or() {
        assert_eq!(finite_or(f64::NAN, 0.0), 0.0);
        assert_eq!(finite_or(1.25, 0.0), 1.25);
    }
}
