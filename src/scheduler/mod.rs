//! Scheduled scan module
//!
//! This module drives the periodic re-verification of tracked items. The
//! tick itself is externally triggered (a cron process, a CLI invocation);
//! nothing here owns a timer.

mod batch;

pub use batch::{BatchScheduler, TickSummary};
