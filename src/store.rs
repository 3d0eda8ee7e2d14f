//! File-resident stores under one data directory (default `~/.drill`).
//!
//! Every store is a pretty-printed JSON document that is read whole and
//! written whole: `<name>.tmp` first, then renamed over the original. Each
//! load remembers the SHA-256 of the bytes it read; a commit re-reads every
//! file it is about to replace and refuses to write anything if one of them
//! changed in the meantime. All tmp files of a commit are written before the
//! first rename, so a failed write replaces nothing.

use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::challenges::ChallengeLog;
use crate::config::SystemConfig;
use crate::error::{DrillError, Result};
use crate::prompts;
use crate::scheduler::SchedulerState;
use crate::weights::WeightStore;
use crate::wildcards::WildcardPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StoreKind {
    Config,
    Weights,
    Wildcards,
    Log,
}

impl StoreKind {
    pub const ALL: [StoreKind; 4] = [Self::Config, Self::Weights, Self::Wildcards, Self::Log];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Config => "system-config.json",
            Self::Weights => "attention-weights.json",
            Self::Wildcards => "wildcard-concepts.json",
            Self::Log => "challenges-log.json",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Weights => "weights",
            Self::Wildcards => "wildcards",
            Self::Log => "challenge log",
        }
    }
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// `$HOME/.drill`, or `./.drill` without a home directory.
pub fn default_root() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".drill")
}

/// A decoded store plus the fingerprint of the bytes it came from.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub value: T,
    fingerprint: String,
}

/// All four stores, loaded for one command.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub state: SchedulerState,
    fingerprints: BTreeMap<StoreKind, String>,
}

struct Pending {
    kind: StoreKind,
    path: PathBuf,
    json: String,
    loaded: String,
}

#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, kind: StoreKind) -> PathBuf {
        self.root.join(kind.file_name())
    }

    fn read<T: DeserializeOwned>(&self, kind: StoreKind) -> Result<Loaded<T>> {
        let path = self.path(kind);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "store unreadable");
                return Err(DrillError::MissingData {
                    store: kind.label(),
                    path,
                });
            }
        };
        let value = serde_json::from_slice(&bytes).map_err(|source| DrillError::Corrupt {
            store: kind.label(),
            path: path.clone(),
            source,
        })?;
        Ok(Loaded {
            value,
            fingerprint: sha256_hex(&bytes),
        })
    }

    /// Load every store. Any missing store aborts before anything else happens.
    pub fn load(&self) -> Result<Snapshot> {
        let config = self.read::<SystemConfig>(StoreKind::Config)?;
        let weights = self.read::<WeightStore>(StoreKind::Weights)?;
        let wildcards = self.read::<WildcardPool>(StoreKind::Wildcards)?;
        let log = self.read::<ChallengeLog>(StoreKind::Log)?;

        let fingerprints = BTreeMap::from([
            (StoreKind::Config, config.fingerprint),
            (StoreKind::Weights, weights.fingerprint),
            (StoreKind::Wildcards, wildcards.fingerprint),
            (StoreKind::Log, log.fingerprint),
        ]);
        Ok(Snapshot {
            state: SchedulerState {
                config: config.value,
                weights: weights.value,
                wildcards: wildcards.value,
                log: log.value,
            },
            fingerprints,
        })
    }

    pub fn load_config(&self) -> Result<Loaded<SystemConfig>> {
        self.read(StoreKind::Config)
    }

    /// Write back every store of `snapshot` whose content changed. Returns
    /// the stores written.
    pub fn commit(&self, snapshot: &Snapshot) -> Result<Vec<StoreKind>> {
        let s = &snapshot.state;
        let fp = |k: StoreKind| snapshot.fingerprints.get(&k).map(String::as_str).unwrap_or("");
        let staged = [
            self.stage(StoreKind::Config, fp(StoreKind::Config), &s.config)?,
            self.stage(StoreKind::Weights, fp(StoreKind::Weights), &s.weights)?,
            self.stage(StoreKind::Wildcards, fp(StoreKind::Wildcards), &s.wildcards)?,
            self.stage(StoreKind::Log, fp(StoreKind::Log), &s.log)?,
        ];
        self.write_all(staged.into_iter().flatten().collect())
    }

    pub fn commit_config(&self, loaded: &Loaded<SystemConfig>) -> Result<Vec<StoreKind>> {
        let staged = self.stage(StoreKind::Config, &loaded.fingerprint, &loaded.value)?;
        self.write_all(staged.into_iter().collect())
    }

    fn stage<T: Serialize>(&self, kind: StoreKind, loaded: &str, value: &T) -> Result<Option<Pending>> {
        let json = serde_json::to_string_pretty(value)?;
        if sha256_hex(json.as_bytes()) == loaded {
            return Ok(None);
        }
        Ok(Some(Pending {
            kind,
            path: self.path(kind),
            json,
            loaded: loaded.to_string(),
        }))
    }

    fn write_all(&self, pending: Vec<Pending>) -> Result<Vec<StoreKind>> {
        // every check passes before the first write
        for p in &pending {
            let current = match fs::read(&p.path) {
                Ok(bytes) => sha256_hex(&bytes),
                Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
                Err(e) => return Err(e.into()),
            };
            if current != p.loaded {
                return Err(DrillError::Conflict {
                    store: p.kind.label(),
                });
            }
        }

        let files: Vec<(&Path, &str)> = pending
            .iter()
            .map(|p| (p.path.as_path(), p.json.as_str()))
            .collect();
        replace_all(&files)?;
        for p in &pending {
            info!(store = p.kind.label(), path = %p.path.display(), bytes = p.json.len(), "store written");
        }
        Ok(pending.into_iter().map(|p| p.kind).collect())
    }

    /// Create the data directory with default config, the built-in concept
    /// catalog, the starter wildcard pool and an empty log.
    pub fn init(&self, force: bool) -> Result<Vec<PathBuf>> {
        if !force {
            let existing: Vec<String> = StoreKind::ALL
                .into_iter()
                .map(|k| self.path(k))
                .filter(|p| p.exists())
                .map(|p| p.display().to_string())
                .collect();
            if !existing.is_empty() {
                return Err(DrillError::Validation(format!(
                    "refusing to overwrite existing stores (use --force): {}",
                    existing.join(", ")
                )));
            }
        }

        fs::create_dir_all(&self.root)?;
        let docs = [
            (StoreKind::Config, serde_json::to_string_pretty(&SystemConfig::default())?),
            (StoreKind::Weights, serde_json::to_string_pretty(&prompts::starter_weights())?),
            (StoreKind::Wildcards, serde_json::to_string_pretty(&prompts::starter_wildcards())?),
            (StoreKind::Log, serde_json::to_string_pretty(&ChallengeLog::new())?),
        ];
        let paths: Vec<PathBuf> = docs.iter().map(|(kind, _)| self.path(*kind)).collect();
        let files: Vec<(&Path, &str)> = paths
            .iter()
            .zip(&docs)
            .map(|(path, (_, json))| (path.as_path(), json.as_str()))
            .collect();
        replace_all(&files)?;
        info!(root = %self.root.display(), "data directory initialised");
        Ok(paths)
    }
}

/// Write every file to its `.tmp` sibling, then rename them into place.
/// A failed tmp write removes the tmp files already written and leaves every
/// target untouched.
fn replace_all(files: &[(&Path, &str)]) -> Result<()> {
    let mut tmps: Vec<PathBuf> = Vec::with_capacity(files.len());
    for (path, json) in files {
        let tmp = path.with_extension("tmp");
        if let Err(e) = fs::write(&tmp, json) {
            debug!(path = %tmp.display(), error = %e, "tmp write failed, discarding staged files");
            for written in &tmps {
                let _ = fs::remove_file(written);
            }
            return Err(e.into());
        }
        tmps.push(tmp);
    }
    for ((path, _), tmp) in files.iter().zip(&tmps) {
        fs::rename(tmp, path)?;
    }
    Ok(())
}
