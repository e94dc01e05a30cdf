//! Best-effort cleanup primitives.

use std::fmt::Display;
use std::sync::Mutex;

/// Explicitly ignorable results.
///
/// Cleanup failures are logged at `debug` and discarded. Calling this marks
/// the spot where an error is intentionally dropped.
pub trait BestEffort<T> {
    fn or_log(self, action: &str) -> Option<T>;
}

impl<T, E: Display> BestEffort<T> for Result<T, E> {
    fn or_log(self, action: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(action, error = %e, "Best-effort step failed, ignoring");
                None
            }
        }
    }
}

type Finalizer = Box<dyn FnOnce() + Send>;

/// Runs a finalizer exactly once.
///
/// Both the normal end of a response and an early drop (client gone) call
/// [`CleanupGuard::finalize`]; whichever comes first runs the finalizer and
/// the other is a no-op. Dropping the guard finalizes too.
pub struct CleanupGuard {
    finalizer: Mutex<Option<Finalizer>>,
}

impl CleanupGuard {
    pub fn new(finalizer: impl FnOnce() + Send + 'static) -> Self {
        Self {
            finalizer: Mutex::new(Some(Box::new(finalizer))),
        }
    }

    /// Run the finalizer if it has not run yet.
    pub fn finalize(&self) {
        let finalizer = match self.finalizer.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(finalizer) = finalizer {
            finalizer();
        }
    }

    /// Whether the finalizer has already run.
    pub fn is_finalized(&self) -> bool {
        match self.finalizer.lock() {
            Ok(slot) => slot.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        self.finalize();
    }
}

impl std::fmt::Debug for CleanupGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupGuard")
            .field("finalized", &self.is_finalized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_guard() -> (CleanupGuard, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let guard = CleanupGuard::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (guard, count)
    }

    #[test]
    fn test_finalize_runs_once() {
        let (guard, count) = counting_guard();
        assert!(!guard.is_finalized());
        guard.finalize();
        guard.finalize();
        assert!(guard.is_finalized());
        drop(guard);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_finalizes() {
        let (guard, count) = counting_guard();
        drop(guard);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_finalize() {
        let (guard, count) = counting_guard();
        let guard = Arc::new(guard);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let g = guard.clone();
                std::thread::spawn(move || g.finalize())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_best_effort() {
        let ok: Result<u8, std::io::Error> = Ok(3);
        assert_eq!(ok.or_log("noop"), Some(3));
        let err: Result<u8, String> = Err("boom".into());
        assert_eq!(err.or_log("noop"), None);
    }
}
