//! Probability model: de-margined true price origin (TPO), Poisson match
//! simulation, and the fixed-weight blend that produces the "true" outcome
//! distribution.

mod simulation;
mod tpo;

pub use simulation::{goal_rates, poisson_sample, simulate_outcomes};
pub use tpo::true_price_origin;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::ModelConfig;
use crate::market::{OddsQuote, OutcomeProbs};

/// Simulation trial bounds; out-of-range configs are clamped, not rejected.
pub const MIN_TRIALS: u32 = 100;
pub const MAX_TRIALS: u32 = 2000;

/// Full output of the probability model for one match.
#[derive(Debug, Clone, Serialize)]
pub struct ModelEstimate {
    /// Raw market implied probabilities, normalized
    pub market: OutcomeProbs,
    /// De-margined true price origin
    pub tpo: OutcomeProbs,
    /// Empirical frequencies from the Poisson simulation
    pub simulated: OutcomeProbs,
    /// Blend of simulated / TPO / market, renormalized
    pub blended: OutcomeProbs,
    /// Expected-goal rates used by the simulation
    pub lambda_home: f64,
    pub lambda_away: f64,
    /// True when the now quote carried no usable price at all
    pub neutral_fallback: bool,
}

/// The TPO + simulation model.
pub struct ProbabilityModel {
    config: ModelConfig,
}

impl ProbabilityModel {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    /// Estimate outcome probabilities from the current market quote.
    pub fn estimate(&self, now: &OddsQuote) -> ModelEstimate {
        self.estimate_with_rng(now, &mut rand::thread_rng())
    }

    /// Deterministic variant for tests and benchmarks.
    pub fn estimate_seeded(&self, now: &OddsQuote, seed: u64) -> ModelEstimate {
        self.estimate_with_rng(now, &mut StdRng::seed_from_u64(seed))
    }

    fn estimate_with_rng<R: Rng>(&self, now: &OddsQuote, rng: &mut R) -> ModelEstimate {
        if !now.has_signal() {
            // No usable prices: every distribution degrades to equal thirds.
            let neutral = OutcomeProbs::neutral();
            return ModelEstimate {
                market: neutral,
                tpo: neutral,
                simulated: neutral,
                blended: neutral,
                lambda_home: self.config.goals_base,
                lambda_away: self.config.goals_base,
                neutral_fallback: true,
            };
        }

        let market = now.implied().normalized();
        let tpo = true_price_origin(now, &self.config);
        let (lambda_home, lambda_away) = goal_rates(&tpo, &self.config);

        let trials = self.config.sim_trials.clamp(MIN_TRIALS, MAX_TRIALS);
        let simulated = simulate_outcomes(lambda_home, lambda_away, trials, rng);

        let blended = OutcomeProbs::new(
            self.config.blend_sim * simulated.home
                + self.config.blend_tpo * tpo.home
                + self.config.blend_market * market.home,
            self.config.blend_sim * simulated.draw
                + self.config.blend_tpo * tpo.draw
                + self.config.blend_market * market.draw,
            self.config.blend_sim * simulated.away
                + self.config.blend_tpo * tpo.away
                + self.config.blend_market * market.away,
        )
        .normalized();

        ModelEstimate {
            market,
            tpo,
            simulated,
            blended,
            lambda_home,
            lambda_away,
            neutral_fallback: false,
        }
    }
}
