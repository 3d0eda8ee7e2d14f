use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DrillError {
    #[error("{store} store missing at {} (run `drill init`)", path.display())]
    MissingData { store: &'static str, path: PathBuf },

    #[error("{store} store at {} is not valid JSON: {source}", path.display())]
    Corrupt {
        store: &'static str,
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{store} store changed on disk since it was loaded; nothing written, rerun the command")]
    Conflict { store: &'static str },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl DrillError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::NotFound(_) => 3,
            Self::MissingData { .. } => 4,
            Self::Conflict { .. } => 5,
            Self::Corrupt { .. } | Self::Io(_) | Self::Json(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, DrillError>;
