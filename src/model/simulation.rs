//! Monte-Carlo match simulation over independent Poisson goal counts.

use rand::Rng;

use crate::config::ModelConfig;
use crate::market::OutcomeProbs;
use crate::numeric::clamp;

/// Map the TPO into expected-goal rates for both sides.
///
/// The log-strength signal `ln(p_home / p_away)` spreads the two rates around
/// the configured baseline; both are clamped into the configured band.
pub fn goal_rates(tpo: &OutcomeProbs, config: &ModelConfig) -> (f64, f64) {
    let floor = config.prob_floor.max(1e-9);
    let strength = (tpo.home.max(floor) / tpo.away.max(floor)).ln();
    let spread = strength * config.strength_scale / 2.0;
    let lambda_home = clamp(
        config.goals_base + spread,
        config.lambda_floor,
        config.lambda_ceil,
    );
    let lambda_away = clamp(
        config.goals_base - spread,
        config.lambda_floor,
        config.lambda_ceil,
    );
    (lambda_home, lambda_away)
}

/// Draw one Poisson-distributed goal count via Knuth's multiplicative
/// rejection method. `lambda = 0` always yields 0.
pub fn poisson_sample<R: Rng>(rng: &mut R, lambda: f64) -> u32 {
    let lambda = lambda.max(0.0);
    let limit = (-lambda).exp();
    let mut k: u32 = 0;
    let mut product: f64 = 1.0;
    loop {
        product *= rng.gen::<f64>();
        if product <= limit {
            return k;
        }
        k += 1;
    }
}

/// Run `trials` independent simulated matches and tally win/draw/loss
/// frequencies.
pub fn simulate_outcomes<R: Rng>(
    lambda_home: f64,
    lambda_away: f64,
    trials: u32,
    rng: &mut R,
) -> OutcomeProbs {
    let mut home = 0u32;
    let mut draw = 0u32;
    let mut away = 0u32;
    for _ in 0..trials {
        let goals_home = poisson_sample(rng, lambda_home);
        let goals_away = poisson_sample(rng, lambda_away);
        if goals_home > goals_away {
            home += 1;
        } else if goals_home < goals_away {
            away += 1;
        } else {
            draw += 1;
        }
    }
    let n = trials.max(1) as f64;
    OutcomeProbs::new(home as f64 / n, draw as f64 / n, away as f64 / n)
}
