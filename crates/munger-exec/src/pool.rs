//! Fail-isolated iteration.
//!
//! Runs an operation over every item, capturing each item's `Result` instead
//! of stopping at the first error. With more than one worker, items are
//! pulled from a shared cursor by scoped threads; outcomes are returned in
//! item order either way. The shutdown signal is checked before each item.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use crate::signal::ShutdownSignal;

#[derive(Debug)]
pub struct Isolated<R, E> {
    /// `(item index, outcome)`, sorted by index.
    pub outcomes: Vec<(usize, Result<R, E>)>,
    /// Shutdown fired before every item was attempted.
    pub cancelled: bool,
}

pub fn for_each_isolated<T, R, E, F>(
    items: &[T],
    workers: usize,
    shutdown: &ShutdownSignal,
    op: F,
) -> Isolated<R, E>
where
    T: Sync,
    R: Send,
    E: Send,
    F: Fn(&T) -> Result<R, E> + Sync,
{
    let workers = workers.max(1).min(items.len().max(1));

    let mut outcomes = if workers == 1 {
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            if shutdown.is_triggered() {
                break;
            }
            out.push((i, op(item)));
        }
        out
    } else {
        let cursor = AtomicUsize::new(0);
        let collected = Mutex::new(Vec::with_capacity(items.len()));
        thread::scope(|s| {
            for _ in 0..workers {
                s.spawn(|| loop {
                    if shutdown.is_triggered() {
                        break;
                    }
                    let i = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(item) = items.get(i) else { break };
                    let res = op(item);
                    collected
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .push((i, res));
                });
            }
        });
        collected.into_inner().unwrap_or_else(|e| e.into_inner())
    };

    outcomes.sort_by_key(|(i, _)| *i);
    let cancelled = outcomes.len() < items.len();
    Isolated {
        outcomes,
        cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn odd_fails(x: &u32) -> Result<u32, String> {
        if x % 2 == 1 {
            Err(format!("odd {x}"))
        } else {
            Ok(x * 10)
        }
    }

    #[test]
    fn errors_do_not_stop_iteration() {
        let items: Vec<u32> = (0..6).collect();
        let res = for_each_isolated(&items, 1, &ShutdownSignal::new(), odd_fails);
        assert!(!res.cancelled);
        assert_eq!(res.outcomes.len(), 6);
        assert_eq!(res.outcomes.iter().filter(|(_, r)| r.is_err()).count(), 3);
        assert_eq!(res.outcomes[4].1.as_ref().unwrap(), &40);
    }

    #[test]
    fn parallel_matches_sequential() {
        let items: Vec<u32> = (0..50).collect();
        let seq = for_each_isolated(&items, 1, &ShutdownSignal::new(), odd_fails);
        let par = for_each_isolated(&items, 8, &ShutdownSignal::new(), odd_fails);
        assert_eq!(seq.outcomes, par.outcomes);
    }

    #[test]
    fn empty_input() {
        let items: Vec<u32> = vec![];
        let res = for_each_isolated(&items, 4, &ShutdownSignal::new(), odd_fails);
        assert!(res.outcomes.is_empty());
        assert!(!res.cancelled);
    }

    #[test]
    fn shutdown_stops_between_items() {
        let items: Vec<u32> = (0..10).collect();
        let shutdown = ShutdownSignal::new();
        let res = for_each_isolated(&items, 1, &shutdown, |x| {
            if *x == 3 {
                shutdown.trigger();
            }
            Ok::<_, String>(*x)
        });
        assert!(res.cancelled);
        assert_eq!(res.outcomes.len(), 4);
    }
}
