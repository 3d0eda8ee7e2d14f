//! Concept selection: weight times recency multiplier, drawn through a [`WeightedSampler`].

use chrono::NaiveDate;
use rand::RngCore;

use crate::recency;
use crate::sampling::WeightedSampler;
use crate::weights::WeightStore;

/// A concept with the numbers that went into its selection odds.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub concept: &'a str,
    pub weight: f64,
    pub multiplier: f64,
}

impl Candidate<'_> {
    pub fn adjusted(&self) -> f64 {
        self.weight * self.multiplier
    }
}

/// Every concept with its recency multiplier for `today`, in name order.
pub fn candidates(weights: &WeightStore, today: NaiveDate) -> Vec<Candidate<'_>> {
    weights
        .iter()
        .map(|(concept, entry)| Candidate {
            concept,
            weight: entry.weight,
            multiplier: recency::multiplier(entry.last_practiced, today),
        })
        .collect()
}

pub struct ConceptSelector<S> {
    sampler: S,
}

impl<S: WeightedSampler> ConceptSelector<S> {
    pub fn new(sampler: S) -> Self {
        Self { sampler }
    }

    /// Draw one concept with probability proportional to weight × recency.
    pub fn select<'a>(
        &self,
        weights: &'a WeightStore,
        today: NaiveDate,
        rng: &mut dyn RngCore,
    ) -> Option<Candidate<'a>> {
        let mut pool = candidates(weights, today);
        let adjusted: Vec<f64> = pool.iter().map(Candidate::adjusted).collect();
        let idx = self.sampler.sample(&adjusted, rng)?;
        Some(pool.swap_remove(idx))
    }
}
