//! Tunable constants of the scheduler, persisted as `system-config.json`.
//!
//! Every tunable is addressable by a kebab-case key (`mastery-wildcard`,
//! `too-easy-adjustment`, ...) so `drill config <key> <value>` can update one
//! value at a time. Updates are applied to a copy and validated as a whole
//! before they replace the live config.

use serde::{Deserialize, Serialize};

use crate::error::{DrillError, Result};
use crate::weights::{MAX_WEIGHT, MIN_WEIGHT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SystemConfig {
    #[serde(default)]
    pub zone_thresholds: ZoneThresholds,
    #[serde(default)]
    pub wildcard_probabilities: WildcardProbabilities,
    #[serde(default)]
    pub weight_adjustments: WeightAdjustments,
    #[serde(default)]
    pub promotion: PromotionRules,
}

/// Average-weight boundaries between zones, ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneThresholds {
    pub mastery: f64,
    pub comfort: f64,
    pub learning: f64,
}

impl Default for ZoneThresholds {
    fn default() -> Self {
        Self {
            mastery: 0.10,
            comfort: 0.25,
            learning: 0.50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildcardProbabilities {
    pub mastery: f64,
    pub comfort: f64,
    pub learning: f64,
    pub foundation: f64,
}

impl Default for WildcardProbabilities {
    fn default() -> Self {
        Self {
            mastery: 0.40,
            comfort: 0.25,
            learning: 0.15,
            foundation: 0.05,
        }
    }
}

/// Weight delta per rating bucket: 9-10, 7-8, 5-6, 3-4, 1-2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightAdjustments {
    pub very_hard: f64,
    pub challenging: f64,
    pub just_right: f64,
    pub getting_easy: f64,
    pub too_easy: f64,
}

impl Default for WeightAdjustments {
    fn default() -> Self {
        Self {
            very_hard: 0.30,
            challenging: 0.15,
            just_right: 0.00,
            getting_easy: -0.10,
            too_easy: -0.25,
        }
    }
}

impl WeightAdjustments {
    pub fn for_rating(&self, rating: u8) -> f64 {
        match rating {
            9.. => self.very_hard,
            7..=8 => self.challenging,
            5..=6 => self.just_right,
            3..=4 => self.getting_easy,
            _ => self.too_easy,
        }
    }
}

/// Cutoffs deciding when a wildcard joins the regular rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionRules {
    pub mastered_max_rating: f64,
    pub mastered_min_attempts: u32,
    pub mastered_weight: f64,
    pub challenging_min_rating: f64,
    pub challenging_min_attempts: u32,
    pub challenging_weight: f64,
}

impl Default for PromotionRules {
    fn default() -> Self {
        Self {
            mastered_max_rating: 3.0,
            mastered_min_attempts: 2,
            mastered_weight: 0.15,
            challenging_min_rating: 7.0,
            challenging_min_attempts: 1,
            challenging_weight: 0.35,
        }
    }
}

/// One addressable tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    MasteryThreshold,
    ComfortThreshold,
    LearningThreshold,
    MasteryWildcard,
    ComfortWildcard,
    LearningWildcard,
    FoundationWildcard,
    VeryHardAdjustment,
    ChallengingAdjustment,
    JustRightAdjustment,
    GettingEasyAdjustment,
    TooEasyAdjustment,
    MasteredMaxRating,
    MasteredMinAttempts,
    MasteredWeight,
    ChallengingMinRating,
    ChallengingMinAttempts,
    ChallengingWeight,
}

impl Setting {
    pub const ALL: [Setting; 18] = [
        Self::MasteryThreshold,
        Self::ComfortThreshold,
        Self::LearningThreshold,
        Self::MasteryWildcard,
        Self::ComfortWildcard,
        Self::LearningWildcard,
        Self::FoundationWildcard,
        Self::VeryHardAdjustment,
        Self::ChallengingAdjustment,
        Self::JustRightAdjustment,
        Self::GettingEasyAdjustment,
        Self::TooEasyAdjustment,
        Self::MasteredMaxRating,
        Self::MasteredMinAttempts,
        Self::MasteredWeight,
        Self::ChallengingMinRating,
        Self::ChallengingMinAttempts,
        Self::ChallengingWeight,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::MasteryThreshold => "mastery-threshold",
            Self::ComfortThreshold => "comfort-threshold",
            Self::LearningThreshold => "learning-threshold",
            Self::MasteryWildcard => "mastery-wildcard",
            Self::ComfortWildcard => "comfort-wildcard",
            Self::LearningWildcard => "learning-wildcard",
            Self::FoundationWildcard => "foundation-wildcard",
            Self::VeryHardAdjustment => "very-hard-adjustment",
            Self::ChallengingAdjustment => "challenging-adjustment",
            Self::JustRightAdjustment => "just-right-adjustment",
            Self::GettingEasyAdjustment => "getting-easy-adjustment",
            Self::TooEasyAdjustment => "too-easy-adjustment",
            Self::MasteredMaxRating => "mastered-max-rating",
            Self::MasteredMinAttempts => "mastered-min-attempts",
            Self::MasteredWeight => "mastered-weight",
            Self::ChallengingMinRating => "challenging-min-rating",
            Self::ChallengingMinAttempts => "challenging-min-attempts",
            Self::ChallengingWeight => "challenging-weight",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }

    pub fn get(self, cfg: &SystemConfig) -> f64 {
        let t = &cfg.zone_thresholds;
        let p = &cfg.wildcard_probabilities;
        let a = &cfg.weight_adjustments;
        let r = &cfg.promotion;
        match self {
            Self::MasteryThreshold => t.mastery,
            Self::ComfortThreshold => t.comfort,
            Self::LearningThreshold => t.learning,
            Self::MasteryWildcard => p.mastery,
            Self::ComfortWildcard => p.comfort,
            Self::LearningWildcard => p.learning,
            Self::FoundationWildcard => p.foundation,
            Self::VeryHardAdjustment => a.very_hard,
            Self::ChallengingAdjustment => a.challenging,
            Self::JustRightAdjustment => a.just_right,
            Self::GettingEasyAdjustment => a.getting_easy,
            Self::TooEasyAdjustment => a.too_easy,
            Self::MasteredMaxRating => r.mastered_max_rating,
            Self::MasteredMinAttempts => f64::from(r.mastered_min_attempts),
            Self::MasteredWeight => r.mastered_weight,
            Self::ChallengingMinRating => r.challenging_min_rating,
            Self::ChallengingMinAttempts => f64::from(r.challenging_min_attempts),
            Self::ChallengingWeight => r.challenging_weight,
        }
    }

    /// Write `value` into `cfg` without checking cross-field invariants.
    fn put(self, cfg: &mut SystemConfig, value: f64) -> Result<()> {
        let t = &mut cfg.zone_thresholds;
        let p = &mut cfg.wildcard_probabilities;
        let a = &mut cfg.weight_adjustments;
        let r = &mut cfg.promotion;
        match self {
            Self::MasteryThreshold => t.mastery = value,
            Self::ComfortThreshold => t.comfort = value,
            Self::LearningThreshold => t.learning = value,
            Self::MasteryWildcard => p.mastery = value,
            Self::ComfortWildcard => p.comfort = value,
            Self::LearningWildcard => p.learning = value,
            Self::FoundationWildcard => p.foundation = value,
            Self::VeryHardAdjustment => a.very_hard = value,
            Self::ChallengingAdjustment => a.challenging = value,
            Self::JustRightAdjustment => a.just_right = value,
            Self::GettingEasyAdjustment => a.getting_easy = value,
            Self::TooEasyAdjustment => a.too_easy = value,
            Self::MasteredMaxRating => r.mastered_max_rating = value,
            Self::MasteredMinAttempts => r.mastered_min_attempts = whole_count(self, value)?,
            Self::MasteredWeight => r.mastered_weight = value,
            Self::ChallengingMinRating => r.challenging_min_rating = value,
            Self::ChallengingMinAttempts => r.challenging_min_attempts = whole_count(self, value)?,
            Self::ChallengingWeight => r.challenging_weight = value,
        }
        Ok(())
    }
}

fn whole_count(setting: Setting, value: f64) -> Result<u32> {
    if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(DrillError::Validation(format!(
            "{} must be a whole number >= 0, got {value}",
            setting.key()
        )));
    }
    Ok(value as u32)
}

impl SystemConfig {
    /// All tunables in display order.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        Setting::ALL
            .into_iter()
            .map(|s| (s.key(), s.get(self)))
            .collect()
    }

    pub fn get(&self, key: &str) -> Result<f64> {
        Setting::from_key(key)
            .map(|s| s.get(self))
            .ok_or_else(|| unknown_key(key))
    }

    /// Parse and apply one update. On any failure `self` is left unchanged.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<f64> {
        let setting = Setting::from_key(key).ok_or_else(|| unknown_key(key))?;
        let value: f64 = raw.trim().parse().map_err(|_| {
            DrillError::Validation(format!("value for {key} must be a number, got '{raw}'"))
        })?;
        if !value.is_finite() {
            return Err(DrillError::Validation(format!(
                "value for {key} must be finite, got '{raw}'"
            )));
        }

        let mut next = self.clone();
        setting.put(&mut next, value)?;
        next.validate()?;
        let old = setting.get(self);
        *self = next;
        Ok(old)
    }

    /// Check every cross-field invariant.
    pub fn validate(&self) -> Result<()> {
        let t = &self.zone_thresholds;
        let thresholds = [t.mastery, t.comfort, t.learning];
        if thresholds.iter().any(|v| !(*v > 0.0 && *v <= 1.0)) {
            return Err(invalid("zone thresholds must lie in (0, 1]"));
        }
        if !strictly_ascending(&thresholds) {
            return Err(invalid(
                "zone thresholds must be strictly ascending: mastery < comfort < learning",
            ));
        }

        let p = &self.wildcard_probabilities;
        let probs = [p.mastery, p.comfort, p.learning, p.foundation];
        if probs.iter().any(|v| !(0.0..=1.0).contains(v)) {
            return Err(invalid("wildcard probabilities must lie in [0, 1]"));
        }
        let mut reversed = probs;
        reversed.reverse();
        if !strictly_ascending(&reversed) {
            return Err(invalid(
                "wildcard probabilities must strictly decrease: mastery > comfort > learning > foundation",
            ));
        }

        let a = &self.weight_adjustments;
        let deltas = [
            a.very_hard,
            a.challenging,
            a.just_right,
            a.getting_easy,
            a.too_easy,
        ];
        if deltas.iter().any(|v| !(-1.0..=1.0).contains(v)) {
            return Err(invalid("weight adjustments must lie in [-1, 1]"));
        }

        let r = &self.promotion;
        for w in [r.mastered_weight, r.challenging_weight] {
            if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&w) {
                return Err(invalid(&format!(
                    "promotion weights must lie in [{MIN_WEIGHT}, {MAX_WEIGHT}]"
                )));
            }
        }
        for rating in [r.mastered_max_rating, r.challenging_min_rating] {
            if !(1.0..=10.0).contains(&rating) {
                return Err(invalid("promotion ratings must lie in [1, 10]"));
            }
        }
        Ok(())
    }
}

fn strictly_ascending(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}

fn invalid(msg: &str) -> DrillError {
    DrillError::Validation(msg.to_string())
}

fn unknown_key(key: &str) -> DrillError {
    let valid: Vec<&str> = Setting::ALL.iter().map(|s| s.key()).collect();
    DrillError::Validation(format!(
        "unknown setting: {key} (valid: {})",
        valid.join(", ")
    ))
}
