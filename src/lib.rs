//! drill: adaptive practice scheduler.
//!
//! Picks the next concept to practise from per-concept attention weights,
//! boosts concepts left alone for a while, and now and then slips in a
//! wildcard from a separate pool. Difficulty ratings move the weights; a
//! wildcard that keeps rating easy or hard is promoted into the rotation.

pub mod challenges;
pub mod config;
pub mod error;
pub mod feedback;
pub mod prompts;
pub mod recency;
pub mod sampling;
pub mod scheduler;
pub mod selector;
pub mod store;
pub mod telemetry;
pub mod weights;
pub mod wildcards;
pub mod zone;

pub use error::{DrillError, Result};
pub use scheduler::SchedulerState;
pub use store::DataDir;
