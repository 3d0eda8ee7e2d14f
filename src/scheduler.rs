//! The scheduler operations as pure transformations over [`SchedulerState`].
//!
//! Nothing in here touches the filesystem or the clock: callers pass `today`,
//! `now` and a random source, and persist the state afterwards. An operation
//! that returns `Err` leaves the state exactly as it found it.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::challenges::{Challenge, ChallengeKind, ChallengeLog, LogMetadata};
use crate::config::SystemConfig;
use crate::error::{DrillError, Result};
use crate::feedback::{self, Promotion, Rating};
use crate::prompts;
use crate::sampling::LinearSampler;
use crate::selector::ConceptSelector;
use crate::weights::{DEFAULT_WEIGHT, WeightStore};
use crate::wildcards::WildcardPool;
use crate::zone::{self, ZoneReading};

/// Everything one command works on, loaded up front and written back at the end.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchedulerState {
    pub config: SystemConfig,
    pub weights: WeightStore,
    pub wildcards: WildcardPool,
    pub log: ChallengeLog,
}

/// Result of `generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateOutcome {
    pub challenge: Challenge,
    /// Probability the coin flip used (1.0 when forced).
    pub wildcard_probability: f64,
    /// Selection odds of the chosen concept, regular path only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionDetail>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SelectionDetail {
    pub weight: f64,
    pub recency_multiplier: f64,
    pub share: f64,
}

/// What feedback did to the weight store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightEffect {
    Adjusted { old: f64, new: f64 },
    Wildcard { promotion: Promotion, average_rating: f64 },
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackOutcome {
    pub id: String,
    pub kind: ChallengeKind,
    pub concept: String,
    pub rating: Rating,
    pub attempts: u32,
    pub effect: WeightEffect,
    pub before: Option<ZoneReading>,
    pub after: Option<ZoneReading>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FocusArea {
    pub concept: String,
    pub weight: f64,
    pub level: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub reading: Option<ZoneReading>,
    /// Probability actually used by `generate` (falls back when no concepts).
    pub wildcard_probability: f64,
    pub concepts: usize,
    pub wildcard_prompts: usize,
    pub focus: Vec<FocusArea>,
    pub totals: LogMetadata,
    pub wildcard_share: f64,
}

/// HIGH / MED / LOW label for a concept weight.
pub fn focus_level(weight: f64) -> &'static str {
    if weight >= 0.40 {
        "HIGH"
    } else if weight >= 0.25 {
        "MED"
    } else {
        "LOW"
    }
}

impl SchedulerState {
    /// Pick the next challenge and append it to the log.
    pub fn generate<R: Rng>(
        &mut self,
        force_wildcard: bool,
        today: NaiveDate,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<GenerateOutcome> {
        let probability = if force_wildcard {
            1.0
        } else {
            zone::wildcard_probability(&self.weights, &self.config)
        };
        let wants_wildcard = rng.gen_bool(probability.clamp(0.0, 1.0));
        debug!(probability, wants_wildcard, forced = force_wildcard, "coin flip");

        let mut path = if wants_wildcard {
            ChallengeKind::Wildcard
        } else {
            ChallengeKind::Regular
        };
        if path == ChallengeKind::Wildcard && self.wildcards.is_empty() {
            if force_wildcard || self.weights.is_empty() {
                return Err(DrillError::NotFound(
                    "no wildcard concepts available".to_string(),
                ));
            }
            warn!("wildcard pool is empty, using regular rotation");
            path = ChallengeKind::Regular;
        }
        if path == ChallengeKind::Regular && self.weights.is_empty() {
            if self.wildcards.is_empty() {
                return Err(DrillError::NotFound(
                    "no concepts or wildcards to practise".to_string(),
                ));
            }
            warn!("no concepts in rotation, drawing a wildcard");
            path = ChallengeKind::Wildcard;
        }

        let (concept, prompt, selection) = match path {
            ChallengeKind::Wildcard => {
                let pick = self.wildcards.pick(rng).ok_or_else(|| {
                    DrillError::NotFound("no wildcard concepts available".to_string())
                })?;
                (pick.category, pick.prompt, None)
            }
            ChallengeKind::Regular => {
                let selector = ConceptSelector::new(LinearSampler);
                let total: f64 = crate::selector::candidates(&self.weights, today)
                    .iter()
                    .map(|c| c.adjusted())
                    .sum();
                let chosen = selector
                    .select(&self.weights, today, rng)
                    .ok_or_else(|| DrillError::NotFound("no concepts to practise".to_string()))?;
                let detail = SelectionDetail {
                    weight: chosen.weight,
                    recency_multiplier: chosen.multiplier,
                    share: if total > 0.0 { chosen.adjusted() / total } else { 0.0 },
                };
                let concept = chosen.concept.to_string();
                let prompt = prompts::concept_prompt(&concept);
                (concept, prompt, Some(detail))
            }
        };

        let id = self.log.next_id(today, path);
        let challenge = Challenge {
            id: id.clone(),
            kind: path,
            concept,
            prompt,
            generated_at: now,
            attempts: 0,
            feedback_history: Vec::new(),
            last_practiced: None,
        };
        self.log.append(challenge.clone());
        info!(%id, kind = %path, concept = %challenge.concept, "challenge generated");

        Ok(GenerateOutcome {
            challenge,
            wildcard_probability: probability,
            selection,
        })
    }

    /// Record a difficulty rating for a generated challenge.
    pub fn feedback(&mut self, id: &str, rating: i64, today: NaiveDate) -> Result<FeedbackOutcome> {
        let rating = Rating::new(rating)?;
        let before = ZoneReading::of(&self.weights, &self.config);
        let Some(challenge) = self.log.get_mut(id) else {
            return Err(DrillError::NotFound(format!("challenge {id} not found")));
        };
        challenge.attempts += 1;
        challenge.feedback_history.push(rating.get());
        challenge.last_practiced = Some(today);

        let effect = match challenge.kind {
            ChallengeKind::Regular => {
                let old = self
                    .weights
                    .weight(&challenge.concept)
                    .unwrap_or(DEFAULT_WEIGHT);
                let new = feedback::adjust_weight(old, rating, &self.config.weight_adjustments);
                self.weights.set(&challenge.concept, new, Some(today));
                WeightEffect::Adjusted { old, new }
            }
            ChallengeKind::Wildcard => {
                let promotion = feedback::evaluate_wildcard(
                    &challenge.feedback_history,
                    challenge.attempts,
                    &self.config.promotion,
                );
                if let Some(weight) = promotion.weight() {
                    self.weights.set(&challenge.concept, weight, Some(today));
                    info!(concept = %challenge.concept, weight, ?promotion, "wildcard promoted");
                }
                WeightEffect::Wildcard {
                    promotion,
                    average_rating: feedback::mean_rating(&challenge.feedback_history)
                        .unwrap_or(f64::from(rating.get())),
                }
            }
        };

        let outcome = FeedbackOutcome {
            id: challenge.id.clone(),
            kind: challenge.kind,
            concept: challenge.concept.clone(),
            rating,
            attempts: challenge.attempts,
            effect,
            before,
            after: ZoneReading::of(&self.weights, &self.config),
        };
        info!(id = %outcome.id, rating = rating.get(), "feedback recorded");
        Ok(outcome)
    }

    pub fn status(&self, top_n: usize) -> StatusReport {
        let focus = self
            .weights
            .top(top_n)
            .into_iter()
            .map(|(concept, weight)| FocusArea {
                concept: concept.to_string(),
                weight,
                level: focus_level(weight),
            })
            .collect();
        StatusReport {
            reading: ZoneReading::of(&self.weights, &self.config),
            wildcard_probability: zone::wildcard_probability(&self.weights, &self.config),
            concepts: self.weights.len(),
            wildcard_prompts: self.wildcards.prompt_count(),
            focus,
            totals: self.log.metadata.clone(),
            wildcard_share: self.log.metadata.wildcard_share(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 8, 30, 0).unwrap()
    }

    fn state() -> SchedulerState {
        SchedulerState {
            config: SystemConfig::default(),
            weights: [("algorithms", 0.6), ("testing", 0.6)].into_iter().collect(),
            wildcards: [("agents", vec!["build a tool loop".to_string()])]
                .into_iter()
                .collect(),
            log: ChallengeLog::new(),
        }
    }

    #[test]
    fn forced_wildcard_draws_from_pool() {
        let mut s = state();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let out = s.generate(true, today(), now(), &mut rng).unwrap();
        assert_eq!(out.challenge.kind, ChallengeKind::Wildcard);
        assert_eq!(out.challenge.id, "2026-10-17-W-001");
        assert_eq!(out.challenge.concept, "agents");
        assert_eq!(out.wildcard_probability, 1.0);
        assert!(out.selection.is_none());
        assert_eq!(s.log.metadata.total_wildcards, 1);
        assert_eq!(s.log.metadata.total_challenges, 1);
    }

    #[test]
    fn forced_wildcard_with_empty_pool_is_not_found() {
        let mut s = state();
        s.wildcards = WildcardPool::new();
        let before = s.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = s.generate(true, today(), now(), &mut rng).unwrap_err();
        assert!(matches!(err, DrillError::NotFound(_)));
        assert_eq!(s, before);
    }

    #[test]
    fn regular_path_records_selection_detail() {
        let mut s = state();
        s.config.wildcard_probabilities.foundation = 0.0;
        s.config.wildcard_probabilities.learning = 0.01;
        s.config.wildcard_probabilities.comfort = 0.02;
        s.config.wildcard_probabilities.mastery = 0.03;
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let out = s.generate(false, today(), now(), &mut rng).unwrap();
        assert_eq!(out.challenge.kind, ChallengeKind::Regular);
        assert_eq!(out.challenge.id, "2026-10-17-R-001");
        let d = out.selection.unwrap();
        assert_eq!(d.recency_multiplier, 2.0);
        assert!((d.share - 0.5).abs() < 1e-12);
        assert!(out.challenge.prompt.len() > 10);
    }

    #[test]
    fn empty_rotation_falls_back_to_wildcard() {
        let mut s = state();
        s.weights = WeightStore::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..5 {
            let out = s.generate(false, today(), now(), &mut rng).unwrap();
            assert_eq!(out.challenge.kind, ChallengeKind::Wildcard);
        }
    }

    #[test]
    fn nothing_to_practise_is_not_found() {
        let mut s = SchedulerState::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(matches!(
            s.generate(false, today(), now(), &mut rng),
            Err(DrillError::NotFound(_))
        ));
        assert!(s.log.is_empty());
    }

    #[test]
    fn regular_feedback_adjusts_weight_and_date() {
        let mut s = state();
        s.config.wildcard_probabilities = crate::config::WildcardProbabilities {
            mastery: 0.03,
            comfort: 0.02,
            learning: 0.01,
            foundation: 0.0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let id = s.generate(false, today(), now(), &mut rng).unwrap().challenge.id;
        let concept = s.log.get(&id).unwrap().concept.clone();

        let out = s.feedback(&id, 9, today()).unwrap();
        assert_eq!(out.attempts, 1);
        match out.effect {
            WeightEffect::Adjusted { old, new } => {
                assert_eq!(old, 0.6);
                assert!((new - 0.9).abs() < 1e-12);
            }
            other => panic!("unexpected {other:?}"),
        }
        let entry = s.weights.get(&concept).unwrap();
        assert_eq!(entry.last_practiced, Some(today()));
        let c = s.log.get(&id).unwrap();
        assert_eq!(c.feedback_history, vec![9]);
        assert_eq!(c.last_practiced, Some(today()));
    }

    #[test]
    fn wildcard_feedback_promotes_after_sustained_ease() {
        let mut s = state();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let id = s.generate(true, today(), now(), &mut rng).unwrap().challenge.id;

        let first = s.feedback(&id, 2, today()).unwrap();
        assert!(matches!(
            first.effect,
            WeightEffect::Wildcard { promotion: Promotion::Continue, .. }
        ));
        assert!(s.weights.get("agents").is_none());

        let second = s.feedback(&id, 3, today()).unwrap();
        match second.effect {
            WeightEffect::Wildcard {
                promotion,
                average_rating,
            } => {
                assert_eq!(promotion, Promotion::Mastered { weight: 0.15 });
                assert_eq!(average_rating, 2.5);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(s.weights.weight("agents"), Some(0.15));
        // record itself stays a wildcard
        assert!(s.log.get(&id).unwrap().is_wildcard());
    }

    #[test]
    fn hard_wildcard_is_promoted_at_once() {
        let mut s = state();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let id = s.generate(true, today(), now(), &mut rng).unwrap().challenge.id;
        s.feedback(&id, 8, today()).unwrap();
        assert_eq!(s.weights.weight("agents"), Some(0.35));
        assert_eq!(s.weights.get("agents").unwrap().last_practiced, Some(today()));
    }

    #[test]
    fn invalid_feedback_changes_nothing() {
        let mut s = state();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let id = s.generate(true, today(), now(), &mut rng).unwrap().challenge.id;
        let before = s.clone();

        assert!(matches!(
            s.feedback("2026-01-01-R-001", 5, today()),
            Err(DrillError::NotFound(_))
        ));
        assert!(matches!(
            s.feedback(&id, 11, today()),
            Err(DrillError::Validation(_))
        ));
        assert!(matches!(
            s.feedback(&id, 0, today()),
            Err(DrillError::Validation(_))
        ));
        assert_eq!(s, before);
    }

    #[test]
    fn feedback_for_vanished_concept_starts_from_default() {
        let mut s = state();
        s.log.append(Challenge {
            id: "2026-10-01-R-001".into(),
            kind: ChallengeKind::Regular,
            concept: "retired".into(),
            prompt: "p".into(),
            generated_at: now(),
            attempts: 0,
            feedback_history: vec![],
            last_practiced: None,
        });
        let out = s.feedback("2026-10-01-R-001", 7, today()).unwrap();
        assert_eq!(
            out.effect,
            WeightEffect::Adjusted {
                old: DEFAULT_WEIGHT,
                new: DEFAULT_WEIGHT + 0.15
            }
        );
    }

    #[test]
    fn status_reports_zone_focus_and_totals() {
        let mut s = state();
        s.weights.set("debugging", 0.3, None);
        s.weights.set("python-basics", 0.1, None);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        s.generate(true, today(), now(), &mut rng).unwrap();

        let r = s.status(3);
        let reading = r.reading.unwrap();
        assert_eq!(reading.zone, zone::Zone::Learning);
        assert!((reading.average - 0.4).abs() < 1e-12);
        assert_eq!(r.wildcard_probability, 0.15);
        assert_eq!(r.concepts, 4);
        let names: Vec<&str> = r.focus.iter().map(|f| f.concept.as_str()).collect();
        assert_eq!(names, vec!["algorithms", "testing", "debugging"]);
        assert_eq!(r.focus[0].level, "HIGH");
        assert_eq!(r.focus[2].level, "MED");
        assert_eq!(r.totals.total_wildcards, 1);
        assert_eq!(r.wildcard_share, 1.0);
    }

    #[test]
    fn status_without_concepts_has_no_reading() {
        let s = SchedulerState::default();
        let r = s.status(5);
        assert!(r.reading.is_none());
        assert_eq!(r.wildcard_probability, zone::FALLBACK_WILDCARD_PROBABILITY);
        assert!(r.focus.is_empty());
    }
}
