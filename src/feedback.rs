//! Turning difficulty ratings into weight changes.
//!
//! A rating is how hard the practice felt, 1 (trivial) to 10 (very hard).
//! Hard practice raises a concept's weight so it comes back sooner; easy
//! practice lowers it. For wildcards the running mean of all ratings decides
//! whether the wildcard joins the regular rotation.

use serde::Serialize;
use std::fmt;

use crate::config::{PromotionRules, WeightAdjustments};
use crate::error::{DrillError, Result};
use crate::weights::clamp_weight;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 10;

/// A difficulty rating known to lie in `[1, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: i64) -> Result<Self> {
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(DrillError::Validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}, got {value}"
            )));
        }
        Ok(Self(value as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/10", self.0)
    }
}

/// New weight for a regular concept after one rating.
pub fn adjust_weight(current: f64, rating: Rating, adjustments: &WeightAdjustments) -> f64 {
    clamp_weight(current + adjustments.for_rating(rating.get()))
}

/// Outcome of evaluating a wildcard's feedback history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Promotion {
    /// Consistently easy: joins the rotation at a moderate weight.
    Mastered { weight: f64 },
    /// Hard: joins the rotation at an elevated weight.
    Challenging { weight: f64 },
    Continue,
}

impl Promotion {
    pub fn weight(self) -> Option<f64> {
        match self {
            Self::Mastered { weight } | Self::Challenging { weight } => Some(weight),
            Self::Continue => None,
        }
    }
}

pub fn mean_rating(history: &[u8]) -> Option<f64> {
    if history.is_empty() {
        return None;
    }
    Some(history.iter().map(|r| f64::from(*r)).sum::<f64>() / history.len() as f64)
}

/// Decide promotion from the full history (latest rating included) and the
/// attempt count after this feedback.
pub fn evaluate_wildcard(history: &[u8], attempts: u32, rules: &PromotionRules) -> Promotion {
    let Some(avg) = mean_rating(history) else {
        return Promotion::Continue;
    };
    if avg <= rules.mastered_max_rating && attempts >= rules.mastered_min_attempts {
        return Promotion::Mastered {
            weight: clamp_weight(rules.mastered_weight),
        };
    }
    if avg >= rules.challenging_min_rating && attempts >= rules.challenging_min_attempts {
        return Promotion::Challenging {
            weight: clamp_weight(rules.challenging_weight),
        };
    }
    Promotion::Continue
}
