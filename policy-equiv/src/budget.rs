//! Solver-independent limits on one satisfiability check.  Backends
//! translate a `ProofBudget` into whatever their solver understands.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A shared cancellation flag.  Clones observe the same flag, so one
/// may be handed to another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Returns the underlying flag, for backends that poll their own
    /// handle.
    #[must_use]
    pub fn shared(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}

/// Wall-clock limit and cancellation flag for one check.  The default
/// budget is unlimited and never cancelled.
#[derive(Clone, Debug, Default)]
pub struct ProofBudget {
    max_time: Option<Duration>,
    cancel: CancelFlag,
}

impl ProofBudget {
    #[must_use]
    pub fn unlimited() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_time(mut self, max_time: Duration) -> Self {
        self.max_time = Some(max_time);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn max_time(&self) -> Option<Duration> {
        self.max_time
    }

    #[must_use]
    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }
}

#[test]
fn test_shared_flag() {
    let flag = CancelFlag::new();
    let budget = ProofBudget::unlimited().with_cancel(flag.clone());
    let shared = budget.cancel_flag().shared();

    assert!(!shared.load(Ordering::Relaxed));
    flag.cancel();
    assert!(shared.load(Ordering::Relaxed));
    assert!(budget.cancel_flag().is_cancelled());
}

#[test]
fn test_max_time() {
    assert_eq!(ProofBudget::unlimited().max_time(), None);
    assert_eq!(
        ProofBudget::unlimited()
            .with_max_time(Duration::from_millis(5))
            .max_time(),
        Some(Duration::from_millis(5))
    );
}
