//! Zones: the overall average weight decides how much room there is for
//! exploration. Low average (most things mastered) means more wildcards.

use serde::Serialize;
use std::fmt;

use crate::config::SystemConfig;
use crate::weights::WeightStore;

/// Wildcard probability used when there are no concepts to average.
pub const FALLBACK_WILDCARD_PROBABILITY: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Mastery,
    Comfort,
    Learning,
    Foundation,
}

impl Zone {
    pub fn label(self) -> &'static str {
        match self {
            Self::Mastery => "MASTERY ZONE",
            Self::Comfort => "COMFORT ZONE",
            Self::Learning => "LEARNING ZONE",
            Self::Foundation => "FOUNDATION ZONE",
        }
    }

    pub fn wildcard_probability(self, cfg: &SystemConfig) -> f64 {
        let p = &cfg.wildcard_probabilities;
        match self {
            Self::Mastery => p.mastery,
            Self::Comfort => p.comfort,
            Self::Learning => p.learning,
            Self::Foundation => p.foundation,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

pub fn classify(average: f64, cfg: &SystemConfig) -> Zone {
    let t = &cfg.zone_thresholds;
    if average < t.mastery {
        Zone::Mastery
    } else if average < t.comfort {
        Zone::Comfort
    } else if average < t.learning {
        Zone::Learning
    } else {
        Zone::Foundation
    }
}

/// Snapshot of where the weight store sits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneReading {
    pub zone: Zone,
    pub average: f64,
    pub wildcard_probability: f64,
}

impl ZoneReading {
    /// `None` when the store has no concepts.
    pub fn of(weights: &WeightStore, cfg: &SystemConfig) -> Option<Self> {
        let average = weights.average()?;
        let zone = classify(average, cfg);
        Some(Self {
            zone,
            average,
            wildcard_probability: zone.wildcard_probability(cfg),
        })
    }
}

pub fn wildcard_probability(weights: &WeightStore, cfg: &SystemConfig) -> f64 {
    ZoneReading::of(weights, cfg)
        .map(|r| r.wildcard_probability)
        .unwrap_or(FALLBACK_WILDCARD_PROBABILITY)
}
