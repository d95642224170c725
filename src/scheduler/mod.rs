//! Scheduler module
//!
//! One fixed-calendar job: refresh the cached quote history for the
//! configured symbol list on weekdays after market close.

mod refresh;

pub use refresh::{RefreshOutcome, RefreshScheduler};
