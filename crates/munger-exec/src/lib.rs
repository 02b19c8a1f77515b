#![forbid(unsafe_code)]
//! munger-exec: cycle driver, scheduler, and per-cycle reports.
//!
//! One cycle fetches the master list once, then walks catalog order ×
//! customer order, isolating every per-customer failure. The scheduler repeats
//! cycles with a fixed delay measured from the end of the previous one.

pub mod metrics;
pub mod pool;
pub mod runtime;
pub mod scheduler;
pub mod signal;

pub use metrics::{CycleReport, SkipKind, SkippedItem};
pub use runtime::{Driver, ExecError};
pub use scheduler::{CycleScheduler, SchedulerExit, SchedulerState};
pub use signal::ShutdownSignal;
