//! Weighted sampling behind a trait, so the selector does not care which
//! distribution turns weights into a pick.

use rand::{Rng, RngCore};

pub trait WeightedSampler {
    /// Index of the chosen weight, or `None` if `weights` is empty.
    fn sample(&self, weights: &[f64], rng: &mut dyn RngCore) -> Option<usize>;
}

/// Roulette-wheel sampling: probability proportional to weight.
///
/// Negative or non-finite weights count as zero. When nothing has positive
/// mass the pick is uniform.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearSampler;

impl WeightedSampler for LinearSampler {
    fn sample(&self, weights: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
        if weights.is_empty() {
            return None;
        }
        let mass = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let total: f64 = weights.iter().copied().map(mass).sum();
        if !(total.is_finite() && total > 0.0) {
            return Some(rng.gen_range(0..weights.len()));
        }

        let draw = rng.gen_range(0.0..total);
        let mut cumulative = 0.0;
        for (i, w) in weights.iter().copied().enumerate() {
            cumulative += mass(w);
            if draw < cumulative {
                return Some(i);
            }
        }
        // float rounding can leave the draw at the very top; take the last
        // entry that carries mass
        weights.iter().rposition(|w| mass(*w) > 0.0)
    }
}
