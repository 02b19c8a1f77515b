//! Fixed-interval cycle scheduler.
//!
//! Two states: `Running` while a cycle executes and `Waiting` in between.
//! The delay is measured from the end of one cycle to the start of the next,
//! so a slow cycle pushes the next one out and cycles never overlap. Cycle
//! errors and panics are logged and treated as completion; only the shutdown
//! signal ends the loop.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::metrics::CycleReport;
use crate::runtime::{Driver, ExecError};
use crate::signal::ShutdownSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Waiting,
    Running,
}

/// Returned once the shutdown signal stops the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerExit {
    pub cycles_completed: u64,
    pub cycles_failed: u64,
}

pub struct CycleScheduler {
    driver: Driver,
    interval: Duration,
    running: AtomicBool,
    completed: AtomicU64,
    failed: AtomicU64,
    last_report: Mutex<Option<CycleReport>>,
}

impl CycleScheduler {
    pub fn new(driver: Driver, interval: Duration) -> Self {
        Self {
            driver,
            interval,
            running: AtomicBool::new(false),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            last_report: Mutex::new(None),
        }
    }

    /// Scheduler with the driver's configured interval.
    pub fn from_driver(driver: Driver) -> Self {
        let interval = driver.config().cycle_interval();
        Self::new(driver, interval)
    }

    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::SeqCst) {
            SchedulerState::Running
        } else {
            SchedulerState::Waiting
        }
    }

    /// Cycles that reached completion, successful or not.
    pub fn cycles_completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Completed cycles that ended in a cycle-level failure or panic.
    pub fn cycles_failed(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }

    /// Report of the most recent cycle that got past the master list.
    pub fn last_report(&self) -> Option<CycleReport> {
        self.report_slot().clone()
    }

    fn report_slot(&self) -> MutexGuard<'_, Option<CycleReport>> {
        self.last_report.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run cycles until `shutdown` fires. The first cycle starts immediately.
    pub fn run(&self, shutdown: &ShutdownSignal) -> SchedulerExit {
        tracing::info!(interval_secs = self.interval.as_secs(), "scheduler started");

        while !shutdown.is_triggered() {
            self.running.store(true, Ordering::SeqCst);
            let outcome = self.run_once(shutdown);
            self.running.store(false, Ordering::SeqCst);
            self.completed.fetch_add(1, Ordering::SeqCst);

            match outcome {
                Ok(report) => {
                    if report.skipped.is_empty() {
                        tracing::info!(cycle = report.cycle, "full cycle completed successfully");
                    } else {
                        tracing::info!(
                            cycle = report.cycle,
                            skipped = report.skipped.len(),
                            "cycle completed with skipped customers"
                        );
                    }
                    *self.report_slot() = Some(report);
                }
                Err(err) => {
                    self.failed.fetch_add(1, Ordering::SeqCst);
                    tracing::error!(error = %err, "full cycle likely not complete");
                }
            }

            tracing::info!(
                wait_secs = self.interval.as_secs(),
                "waiting before starting the next cycle"
            );
            if shutdown.wait_timeout(self.interval) {
                break;
            }
        }

        let exit = SchedulerExit {
            cycles_completed: self.cycles_completed(),
            cycles_failed: self.cycles_failed(),
        };
        tracing::info!(
            cycles = exit.cycles_completed,
            failed = exit.cycles_failed,
            "scheduler stopped"
        );
        exit
    }

    /// One cycle with panics converted into `ExecError::Panicked`.
    fn run_once(&self, shutdown: &ShutdownSignal) -> Result<CycleReport, ExecError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.driver.run_cycle(shutdown)))
            .unwrap_or_else(|payload| Err(ExecError::Panicked(panic_message(payload))))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_extracts_strings() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_message(Box::new(7u8)), "unknown panic payload");
    }
}
