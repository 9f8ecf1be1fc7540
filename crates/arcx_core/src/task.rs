//! Coordination of long running operations.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::error::{Error, Result};

/// Admits one long running task at a time
#[derive(Debug, Default, Clone)]
pub struct TaskGate {
    busy: Arc<AtomicBool>,
}

/// Held while a task runs, opens the gate again when dropped
#[derive(Debug)]
#[must_use = "the gate reopens as soon as the guard is dropped"]
pub struct TaskGuard {
    busy: Arc<AtomicBool>,
}

impl TaskGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate without waiting, failing with [`Error::Busy`] when it is taken
    pub fn try_acquire(&self) -> Result<TaskGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::Busy)?;
        Ok(TaskGuard {
            busy: self.busy.clone(),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Shared flag asking a running task to stop at its next checkpoint
#[derive(Debug, Default, Clone)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Fail with [`Error::Cancelled`] once cancellation was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn second_task_is_refused_until_the_first_ends() {
        let gate = TaskGate::new();
        let guard = gate.try_acquire().unwrap();
        assert!(gate.is_busy());
        assert!(matches!(gate.clone().try_acquire(), Err(Error::Busy)));

        drop(guard);
        assert!(!gate.is_busy());
        assert!(gate.try_acquire().is_ok());
    }

    #[test]
    fn cancellation_is_shared() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(token.check().is_ok());

        other.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(Error::Cancelled)));
    }
}
