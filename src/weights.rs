//! Concept attention weights, persisted as `attention-weights.json`.
//!
//! Each concept carries a weight in `[MIN_WEIGHT, MAX_WEIGHT]` (higher means it
//! needs more practice) and the date it was last practised. Older files stored
//! a bare number per concept; those load as entries with no date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MIN_WEIGHT: f64 = 0.05;
pub const MAX_WEIGHT: f64 = 1.0;
/// Starting weight for concepts seeded by `init` or missing from the store.
pub const DEFAULT_WEIGHT: f64 = 0.20;

pub fn clamp_weight(w: f64) -> f64 {
    if w.is_nan() {
        return MIN_WEIGHT;
    }
    w.clamp(MIN_WEIGHT, MAX_WEIGHT)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EntryRepr")]
pub struct ConceptEntry {
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_practiced: Option<NaiveDate>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntryRepr {
    Full {
        weight: f64,
        #[serde(default)]
        last_practiced: Option<NaiveDate>,
    },
    Bare(f64),
}

impl From<EntryRepr> for ConceptEntry {
    fn from(repr: EntryRepr) -> Self {
        match repr {
            EntryRepr::Full {
                weight,
                last_practiced,
            } => Self {
                weight: clamp_weight(weight),
                last_practiced,
            },
            EntryRepr::Bare(weight) => Self {
                weight: clamp_weight(weight),
                last_practiced: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightStore {
    concepts: BTreeMap<String, ConceptEntry>,
}

impl WeightStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn get(&self, concept: &str) -> Option<&ConceptEntry> {
        self.concepts.get(concept)
    }

    pub fn weight(&self, concept: &str) -> Option<f64> {
        self.concepts.get(concept).map(|e| e.weight)
    }

    /// Concepts in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConceptEntry)> {
        self.concepts.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn weights(&self) -> impl Iterator<Item = f64> + '_ {
        self.concepts.values().map(|e| e.weight)
    }

    /// Mean weight, or `None` when there are no concepts.
    pub fn average(&self) -> Option<f64> {
        if self.concepts.is_empty() {
            return None;
        }
        Some(self.weights().sum::<f64>() / self.concepts.len() as f64)
    }

    /// Insert or overwrite a concept's weight (clamped) and optionally stamp
    /// its practice date. Returns the previous weight, if any.
    pub fn set(&mut self, concept: &str, weight: f64, practiced: Option<NaiveDate>) -> Option<f64> {
        let weight = clamp_weight(weight);
        match self.concepts.get_mut(concept) {
            Some(entry) => {
                let old = entry.weight;
                entry.weight = weight;
                if practiced.is_some() {
                    entry.last_practiced = practiced;
                }
                Some(old)
            }
            None => {
                self.concepts.insert(
                    concept.to_string(),
                    ConceptEntry {
                        weight,
                        last_practiced: practiced,
                    },
                );
                None
            }
        }
    }

    /// Concepts sorted by weight descending (ties by name), truncated to `n`.
    pub fn top(&self, n: usize) -> Vec<(&str, f64)> {
        let mut all: Vec<(&str, f64)> = self.iter().map(|(k, e)| (k, e.weight)).collect();
        all.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        all.truncate(n);
        all
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for WeightStore {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (k, w) in iter {
            let k: String = k.into();
            store.set(&k, w, None);
        }
        store
    }
}
