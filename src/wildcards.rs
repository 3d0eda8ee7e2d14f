//! Wildcard pool, persisted as `wildcard-concepts.json`: category -> prompts.
//!
//! Curated by hand; the scheduler only reads it. Selection is uniform and
//! ignores weights.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WildcardPool {
    categories: BTreeMap<String, Vec<String>>,
}

/// A drawn wildcard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WildcardPick {
    pub category: String,
    pub prompt: String,
}

impl WildcardPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: &str, prompts: Vec<String>) {
        self.categories.insert(category.to_string(), prompts);
    }

    /// True when no category has a prompt to offer.
    pub fn is_empty(&self) -> bool {
        self.categories.values().all(Vec::is_empty)
    }

    pub fn prompt_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// Uniform category (among those with prompts), then uniform prompt.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Option<WildcardPick> {
        let stocked: Vec<(&String, &Vec<String>)> = self
            .categories
            .iter()
            .filter(|(_, prompts)| !prompts.is_empty())
            .collect();
        let (category, prompts) = stocked.choose(rng)?;
        let prompt = prompts.choose(rng)?;
        Some(WildcardPick {
            category: (*category).clone(),
            prompt: prompt.clone(),
        })
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<String>)> for WildcardPool {
    fn from_iter<I: IntoIterator<Item = (S, Vec<String>)>>(iter: I) -> Self {
        Self {
            categories: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
