//! Cooperative shutdown flag shared between the scheduler, the driver, and
//! whoever wants to stop them (signal handler, tests).

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self) -> MutexGuard<'_, bool> {
        self.inner.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Request shutdown and wake any waiter.
    pub fn trigger(&self) {
        *self.flag() = true;
        self.inner.1.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.flag()
    }

    /// Sleep up to `timeout`, returning early if triggered.
    /// Returns whether shutdown was requested.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.flag();
        let (guard, _) = self
            .inner
            .1
            .wait_timeout_while(guard, timeout, |triggered| !*triggered)
            .unwrap_or_else(|e| e.into_inner());
        *guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn times_out_when_untouched() {
        let s = ShutdownSignal::new();
        assert!(!s.wait_timeout(Duration::from_millis(10)));
        assert!(!s.is_triggered());
    }

    #[test]
    fn trigger_wakes_waiter() {
        let s = ShutdownSignal::new();
        let other = s.clone();
        let start = Instant::now();
        let h = thread::spawn(move || other.wait_timeout(Duration::from_secs(30)));
        thread::sleep(Duration::from_millis(20));
        s.trigger();
        assert!(h.join().unwrap());
        assert!(start.elapsed() < Duration::from_secs(30));
    }

    #[test]
    fn already_triggered_returns_immediately() {
        let s = ShutdownSignal::new();
        s.trigger();
        assert!(s.wait_timeout(Duration::from_secs(30)));
    }
}
