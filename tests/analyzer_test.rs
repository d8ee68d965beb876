//! End-to-end analysis pipeline tests

use std::sync::Arc;

use serde_json::json;

use oddsflow::analyzer::{Analyzer, FinalLabel, MatchPayload, Recommendation};
use oddsflow::config::Config;
use oddsflow::market::Outcome;
use oddsflow::store::{JsonFileStore, MemoryStore, QueryOrder, RecordStore};

fn analyzer() -> Analyzer {
    Analyzer::new(Config::default(), Some(Arc::new(MemoryStore::new())))
}

fn payload(value: serde_json::Value) -> MatchPayload {
    MatchPayload::from_value(value).unwrap()
}

/// Heavy coordinated move onto the home side across every market.
#[test]
fn test_coordinated_home_move_is_smart_money() {
    let result = analyzer()
        .analyze(&payload(json!({
            "home_team": "Sevilla",
            "away_team": "Valencia",
            "league": "La Liga",
            "open1": {"home": 2.10, "draw": 3.40, "away": 3.10},
            "now1":  {"home": 1.78, "draw": 3.60, "away": 4.20},
            "handicap_lines": [
                {"label": "-0.25", "open_home": 1.90, "open_away": 1.90,
                 "now_home": 1.75, "now_away": 2.05},
                {"label": "-0.5", "open_home": 1.85, "open_away": 1.95,
                 "now_home": 1.70, "now_away": 2.10},
                {"label": "0", "open_home": 2.00, "open_away": 1.80,
                 "now_home": 1.85, "now_away": 1.95},
            ],
        })))
        .unwrap();

    assert_eq!(result.predicted_winner, Some(Outcome::Home));
    assert_eq!(result.final_label, FinalLabel::SmartMoneyConfirmed);
    assert_eq!(result.recommendation, Recommendation::Follow);
    assert_eq!(result.disparity.label.as_label(), "home_more_backed");
    assert!((result.smart_money.stacking - 1.0).abs() < 1e-12);
    assert!((result.smart_money.sync_ratio - 1.0).abs() < 1e-12);
    assert!(result.smart_money.sharp);
    assert!(!result.smart_money.trap);
    assert!((result.true_probs.sum() - 1.0).abs() < 1e-6);
    assert!(result.market_probs.home > 0.5);
}

/// A market that has not moved at all carries no actionable signal.
#[test]
fn test_static_market_is_unclear_wait() {
    let result = analyzer()
        .analyze(&payload(json!({
            "home_team": "Lyon",
            "away_team": "Lille",
            "open1": {"home": 2.50, "draw": 3.20, "away": 2.90},
            "now1":  {"home": 2.50, "draw": 3.20, "away": 2.90},
        })))
        .unwrap();

    assert_eq!(result.final_label, FinalLabel::UnclearWait);
    assert_eq!(result.recommendation, Recommendation::Wait);
    assert_eq!(result.smart_money.score, 0.0);
    assert_eq!(result.disparity.label.as_label(), "neutral");
    assert_eq!(result.divergence.conflicts, 0);
    // A clean book still produces a prediction, just not a play.
    assert!(result.predicted_winner.is_some());
}

/// One loud handicap line against four flat ones looks like bait.
#[test]
fn test_isolated_loud_line_is_trap() {
    let flat = json!({"label": "x", "open_home": 1.90, "open_away": 1.90,
                      "now_home": 1.90, "now_away": 1.90});
    let result = analyzer()
        .analyze(&payload(json!({
            "home_team": "Porto",
            "away_team": "Braga",
            "open1": {"home": 2.00, "draw": 3.30, "away": 3.50},
            "now1":  {"home": 2.00, "draw": 3.30, "away": 3.50},
            "handicap_lines": [
                {"label": "-0.5", "open_home": 2.10, "open_away": 1.75,
                 "now_home": 1.80, "now_away": 2.05},
                flat.clone(), flat.clone(), flat.clone(), flat,
            ],
        })))
        .unwrap();

    assert!(result.smart_money.trap);
    assert!(result.smart_money.stacking < 0.25);
    assert_eq!(result.final_label, FinalLabel::TrapSuspected);
    assert_eq!(result.recommendation, Recommendation::Fade);
}

/// No odds at all: neutral thirds, no prediction, wait.
#[test]
fn test_missing_odds_degrade_to_neutral() {
    let result = analyzer()
        .analyze(&payload(json!({
            "home_team": "A",
            "away_team": "B",
        })))
        .unwrap();

    assert!(result.predicted_winner.is_none());
    assert_eq!(result.recommendation, Recommendation::Wait);
    for p in [
        result.true_probs.home,
        result.true_probs.draw,
        result.true_probs.away,
    ] {
        assert!((p - 1.0 / 3.0).abs() < 1e-9);
    }
}

/// Garbage odds strings degrade per-field rather than failing the request.
#[test]
fn test_malformed_odds_fields_degrade() {
    let result = analyzer()
        .analyze(&payload(json!({
            "home_team": "A",
            "away_team": "B",
            "open1": {"home": "2,10", "draw": "abc", "away": null},
            "now1":  {"home": 1.95, "draw": 3.60, "away": 3.80},
        })))
        .unwrap();

    assert!(result.predicted_winner.is_some());
    assert!((result.true_probs.sum() - 1.0).abs() < 1e-6);
}

/// Analyses and resolutions survive a store reopen.
#[test]
fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();
    let p = payload(json!({
        "home_team": "Ajax",
        "away_team": "PSV",
        "open1": {"home": 2.10, "draw": 3.40, "away": 3.10},
        "now1":  {"home": 1.95, "draw": 3.60, "away": 3.80},
    }));

    {
        let store: Arc<dyn RecordStore> =
            Arc::new(JsonFileStore::open(dir.path()).unwrap());
        let analyzer = Analyzer::new(config.clone(), Some(store));
        analyzer.analyze(&p).unwrap();
    }

    let store: Arc<dyn RecordStore> = Arc::new(JsonFileStore::open(dir.path()).unwrap());
    let cases = store
        .query("match_cases", None, 10, QueryOrder::Newest)
        .unwrap();
    assert_eq!(cases.len(), 1);

    let analyzer = Analyzer::new(config, Some(store));
    let summary = analyzer
        .resolve("ajax__psv", Outcome::Home)
        .unwrap()
        .unwrap();
    assert_eq!(summary.pattern_occurrences, 1);
}

/// Repeated analyses move the EWMA baselines the caller sees.
#[test]
fn test_signal_baselines_accumulate() {
    let analyzer = analyzer();
    let p = payload(json!({
        "home_team": "A",
        "away_team": "B",
        "open1": {"home": 2.10, "draw": 3.40, "away": 3.10},
        "now1":  {"home": 1.80, "draw": 3.70, "away": 4.10},
    }));

    let first = analyzer.analyze(&p).unwrap();
    assert_eq!(first.metrics.baselines.juice_pressure, 0.0);

    let second = analyzer.analyze(&p).unwrap();
    assert!(second.metrics.baselines.juice_pressure > 0.0);
    assert!(second.metrics.baselines.juice_pressure < first.metrics.raw_pressure);
}
