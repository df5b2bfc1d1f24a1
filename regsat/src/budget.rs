//! Time and cancellation limits for satisfiability checks.
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A shared flag that aborts any check watching it.  Clones observe
/// the same flag, so one may be handed to another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every check that watches this flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Wraps a flag owned by a caller, so that setting it cancels checks
/// watching this `CancelFlag`.
impl From<Arc<AtomicBool>> for CancelFlag {
    fn from(flag: Arc<AtomicBool>) -> Self {
        CancelFlag(flag)
    }
}

/// How much effort a single check may spend.  The default budget is
/// unlimited.
#[derive(Clone, Debug, Default)]
pub struct Budget {
    max_time: Option<Duration>,
    cancel: Option<CancelFlag>,
}

impl Budget {
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
        self.cancel = Some(cancel);
        self
    }

    #[must_use]
    pub fn max_time(&self) -> Option<Duration> {
        self.max_time
    }

    /// Starts the clock for one check.
    pub(crate) fn start(&self) -> Clock {
        Clock {
            deadline: self.max_time.map(|limit| Instant::now() + limit),
            cancel: self.cancel.clone(),
        }
    }
}

/// Why a check could not reach a verdict.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnknownReason {
    TimedOut,
    Cancelled,
    /// The SAT core returned `Undef` on its own.
    SolverGaveUp,
}

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownReason::TimedOut => write!(f, "time budget exhausted"),
            UnknownReason::Cancelled => write!(f, "check cancelled"),
            UnknownReason::SolverGaveUp => write!(f, "SAT solver returned an undefined result"),
        }
    }
}

/// A running budget.
pub(crate) struct Clock {
    deadline: Option<Instant>,
    cancel: Option<CancelFlag>,
}

impl Clock {
    /// Returns `Some` once the check must stop.
    pub fn interrupted(&self) -> Option<UnknownReason> {
        if self.cancel.as_ref().map_or(false, CancelFlag::is_cancelled) {
            return Some(UnknownReason::Cancelled);
        }

        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(UnknownReason::TimedOut),
            _ => None,
        }
    }

    /// Returns the time left before the deadline, if there is one.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

#[test]
fn test_unlimited() {
    let clock = Budget::unlimited().start();

    assert_eq!(clock.interrupted(), None);
    assert_eq!(clock.remaining(), None);
}

#[test]
fn test_cancel() {
    let flag = CancelFlag::new();
    let clock = Budget::unlimited().with_cancel(flag.clone()).start();

    assert_eq!(clock.interrupted(), None);
    flag.cancel();
    assert_eq!(clock.interrupted(), Some(UnknownReason::Cancelled));
}

#[test]
fn test_cancel_from_shared() {
    let shared = Arc::new(AtomicBool::new(false));
    let clock = Budget::unlimited()
        .with_cancel(CancelFlag::from(Arc::clone(&shared)))
        .start();

    assert_eq!(clock.interrupted(), None);
    shared.store(true, Ordering::Relaxed);
    assert_eq!(clock.interrupted(), Some(UnknownReason::Cancelled));
}

#[test]
fn test_zero_time() {
    let clock = Budget::unlimited().with_max_time(Duration::from_secs(0)).start();

    assert_eq!(clock.interrupted(), Some(UnknownReason::TimedOut));
    assert_eq!(clock.remaining(), Some(Duration::from_secs(0)));
}
