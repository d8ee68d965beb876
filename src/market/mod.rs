//! Market primitives: outcomes, odds quotes, probability triples and
//! Asian-Handicap lines with their derived per-request metrics.

use serde::{Deserialize, Serialize};

use crate::numeric::{self, direction, net_flow, Direction};

/// Lenient serde for odds fields: accepts a JSON number, a numeric string
/// (comma decimal separator allowed) or null, and round-trips NaN as null.
pub mod lenient_odds {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(v: &f64, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if v.is_finite() {
            s.serialize_f64(*v)
        } else {
            s.serialize_none()
        }
    }

    pub fn deserialize<'de, D>(d: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(f64),
            Text(String),
        }

        Ok(match Option::<Raw>::deserialize(d)? {
            Some(Raw::Num(v)) => v,
            Some(Raw::Text(s)) => crate::numeric::parse_odds(&s),
            None => f64::NAN,
        })
    }
}

pub(crate) fn nan() -> f64 {
    f64::NAN
}

/// One of the three 1X2 outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Home, Outcome::Draw, Outcome::Away];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Home => "home",
            Outcome::Draw => "draw",
            Outcome::Away => "away",
        }
    }
}

impl std::str::FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "home" | "1" => Ok(Outcome::Home),
            "draw" | "x" => Ok(Outcome::Draw),
            "away" | "2" => Ok(Outcome::Away),
            other => Err(format!("unknown outcome: {other}")),
        }
    }
}

/// A three-way 1X2 odds snapshot. Missing or malformed prices are NaN.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OddsQuote {
    #[serde(default = "nan", with = "lenient_odds")]
    pub home: f64,
    #[serde(default = "nan", with = "lenient_odds")]
    pub draw: f64,
    #[serde(default = "nan", with = "lenient_odds")]
    pub away: f64,
}

impl OddsQuote {
    pub fn new(home: f64, draw: f64, away: f64) -> Self {
        Self { home, draw, away }
    }

    pub fn empty() -> Self {
        Self::new(f64::NAN, f64::NAN, f64::NAN)
    }

    pub fn get(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Home => self.home,
            Outcome::Draw => self.draw,
            Outcome::Away => self.away,
        }
    }

    /// True when at least one side carries a usable (finite, positive) price.
    pub fn has_signal(&self) -> bool {
        Outcome::ALL
            .iter()
            .any(|o| numeric::implied_probability(self.get(*o)).is_finite())
    }

    /// Raw implied probabilities, NaN where the price is missing.
    pub fn implied(&self) -> OutcomeProbs {
        OutcomeProbs {
            home: numeric::implied_probability(self.home),
            draw: numeric::implied_probability(self.draw),
            away: numeric::implied_probability(self.away),
        }
    }
}

/// A probability (or probability-like) triple over the 1X2 outcomes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OutcomeProbs {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl OutcomeProbs {
    pub fn new(home: f64, draw: f64, away: f64) -> Self {
        Self { home, draw, away }
    }

    /// Equal thirds: the no-signal default distribution.
    pub fn neutral() -> Self {
        Self::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0)
    }

    pub fn get(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Home => self.home,
            Outcome::Draw => self.draw,
            Outcome::Away => self.away,
        }
    }

    /// Sum of the finite components (NaN counts as zero).
    pub fn sum(&self) -> f64 {
        Outcome::ALL
            .iter()
            .map(|o| numeric::finite_or(self.get(*o), 0.0))
            .sum()
    }

    /// Normalize the finite components to sum to 1. Falls back to the neutral
    /// distribution when nothing finite and positive remains.
    pub fn normalized(&self) -> Self {
        let sum = self.sum();
        if sum <= 0.0 || !sum.is_finite() {
            return Self::neutral();
        }
        Self::new(
            numeric::finite_or(self.home, 0.0) / sum,
            numeric::finite_or(self.draw, 0.0) / sum,
            numeric::finite_or(self.away, 0.0) / sum,
        )
    }

    /// The most likely outcome.
    pub fn argmax(&self) -> Outcome {
        let mut best = Outcome::Home;
        for o in [Outcome::Draw, Outcome::Away] {
            if numeric::finite_or(self.get(o), 0.0) > numeric::finite_or(self.get(best), 0.0) {
                best = o;
            }
        }
        best
    }

    /// Gap between the top outcome and the runner-up.
    pub fn margin(&self) -> f64 {
        let mut vals: Vec<f64> = Outcome::ALL
            .iter()
            .map(|o| numeric::finite_or(self.get(*o), 0.0))
            .collect();
        vals.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        vals[0] - vals[1]
    }
}

/// One Asian-Handicap line as it arrives in the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHandicapLine {
    #[serde(default)]
    pub label: String,
    #[serde(default = "nan", with = "lenient_odds")]
    pub open_home: f64,
    #[serde(default = "nan", with = "lenient_odds")]
    pub open_away: f64,
    #[serde(default = "nan", with = "lenient_odds")]
    pub now_home: f64,
    #[serde(default = "nan", with = "lenient_odds")]
    pub now_away: f64,
}

/// A handicap line with its per-request derived metrics. Immutable once
/// derived.
#[derive(Debug, Clone, Serialize)]
pub struct HandicapLine {
    pub label: String,
    #[serde(with = "lenient_odds")]
    pub open_home: f64,
    #[serde(with = "lenient_odds")]
    pub open_away: f64,
    #[serde(with = "lenient_odds")]
    pub now_home: f64,
    #[serde(with = "lenient_odds")]
    pub now_away: f64,
    #[serde(with = "lenient_odds")]
    pub net_home: f64,
    #[serde(with = "lenient_odds")]
    pub net_away: f64,
    #[serde(with = "lenient_odds")]
    pub momentum_home: f64,
    #[serde(with = "lenient_odds")]
    pub momentum_away: f64,
    pub direction_home: Direction,
    pub direction_away: Direction,
}

impl HandicapLine {
    /// Derive net flow, momentum and direction labels from a raw line.
    pub fn derive(raw: &RawHandicapLine) -> Self {
        let net_home = net_flow(raw.open_home, raw.now_home);
        let net_away = net_flow(raw.open_away, raw.now_away);
        Self {
            label: raw.label.clone(),
            open_home: raw.open_home,
            open_away: raw.open_away,
            now_home: raw.now_home,
            now_away: raw.now_away,
            net_home,
            net_away,
            momentum_home: relative_momentum(net_home, raw.open_home),
            momentum_away: relative_momentum(net_away, raw.open_away),
            direction_home: direction(raw.open_home, raw.now_home),
            direction_away: direction(raw.open_away, raw.now_away),
        }
    }

    /// Aggregate absolute price movement across both sides of the line.
    pub fn abs_movement(&self) -> f64 {
        numeric::finite_or(self.net_home.abs(), 0.0) + numeric::finite_or(self.net_away.abs(), 0.0)
    }
}

/// Open-to-now movement summary of the 1X2 market.
#[derive(Debug, Clone, Serialize)]
pub struct OneXTwoMovement {
    /// Net price flow per outcome (`open - now`), NaN where unquoted
    pub net: OutcomeProbs,
    pub direction_home: Direction,
    pub direction_draw: Direction,
    pub direction_away: Direction,
    /// Aggregate absolute movement across the three outcomes
    pub total_abs: f64,
}

impl OneXTwoMovement {
    pub fn derive(open: &OddsQuote, now: &OddsQuote) -> Self {
        let net = OutcomeProbs::new(
            net_flow(open.home, now.home),
            net_flow(open.draw, now.draw),
            net_flow(open.away, now.away),
        );
        let total_abs = Outcome::ALL
            .iter()
            .map(|o| numeric::finite_or(net.get(*o).abs(), 0.0))
            .sum();
        Self {
            net,
            direction_home: direction(open.home, now.home),
            direction_draw: direction(open.draw, now.draw),
            direction_away: direction(open.away, now.away),
            total_abs,
        }
    }
}

fn relative_momentum(net: f64, open: f64) -> f64 {
    if net.is_finite() && open.is_finite() && open > 0.0 {
        net / open
    } else {
        f64::NAN
    }
}
