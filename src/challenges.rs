//! Append-only challenge log, persisted as `challenges-log.json`.
//!
//! Records are never removed; feedback only appends ratings and bumps the
//! attempt count, so the log doubles as an audit trail of every practice
//! session.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    Regular,
    Wildcard,
}

impl ChallengeKind {
    /// Single-letter flag used inside challenge ids.
    pub fn flag(self) -> char {
        match self {
            Self::Regular => 'R',
            Self::Wildcard => 'W',
        }
    }
}

impl fmt::Display for ChallengeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Regular => "regular",
            Self::Wildcard => "wildcard",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChallengeKind,
    /// Concept for regular challenges, category for wildcards.
    pub concept: String,
    pub prompt: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub feedback_history: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_practiced: Option<NaiveDate>,
}

impl Challenge {
    pub fn is_wildcard(&self) -> bool {
        self.kind == ChallengeKind::Wildcard
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogMetadata {
    #[serde(default)]
    pub total_challenges: u64,
    #[serde(default)]
    pub total_wildcards: u64,
}

impl LogMetadata {
    /// Share of generated challenges that were wildcards, 0 when none yet.
    pub fn wildcard_share(&self) -> f64 {
        self.total_wildcards as f64 / self.total_challenges.max(1) as f64
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChallengeLog {
    #[serde(default)]
    pub challenges: BTreeMap<String, Challenge>,
    #[serde(default)]
    pub metadata: LogMetadata,
}

impl ChallengeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Challenge> {
        self.challenges.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Challenge> {
        self.challenges.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }

    /// Next free id for `date` and `kind`: `<date>-<flag>-<NNN>`.
    ///
    /// The counter is the number of ids already issued for that date and
    /// flag, plus one; ids are never deleted so the count only grows.
    pub fn next_id(&self, date: NaiveDate, kind: ChallengeKind) -> String {
        let prefix = format!("{}-{}-", date.format("%Y-%m-%d"), kind.flag());
        let issued = self
            .challenges
            .keys()
            .filter(|id| {
                id.strip_prefix(&prefix)
                    .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            })
            .count();
        let mut counter = issued + 1;
        loop {
            let id = format!("{prefix}{counter:03}");
            if !self.challenges.contains_key(&id) {
                return id;
            }
            counter += 1;
        }
    }

    /// Append a new record and bump the counters.
    pub fn append(&mut self, challenge: Challenge) {
        self.metadata.total_challenges += 1;
        if challenge.is_wildcard() {
            self.metadata.total_wildcards += 1;
        }
        self.challenges.insert(challenge.id.clone(), challenge);
    }

    /// Most recently generated first.
    pub fn recent(&self, limit: usize) -> Vec<&Challenge> {
        let mut all: Vec<&Challenge> = self.challenges.values().collect();
        all.sort_by(|a, b| {
            b.generated_at
                .cmp(&a.generated_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        all.truncate(limit);
        all
    }
}
