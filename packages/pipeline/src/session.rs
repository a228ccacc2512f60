// ABOUTME: Exclusively owned session state with epoch-guarded mutation
// ABOUTME: A new prompt bumps the epoch; writes tagged with an older epoch are rejected

use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use adapt_core::{Session, SessionStatus};

/// A write arrived for an epoch that is no longer current
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("epoch {epoch} superseded by epoch {current}")]
pub struct Superseded {
    pub epoch: u64,
    pub current: u64,
}

/// Shared handle to the single session.
///
/// The lock is only held for the duration of a synchronous update, never
/// across a collaborator call.
#[derive(Debug, Default)]
pub struct SessionCell {
    inner: Mutex<Session>,
}

impl SessionCell {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }

    pub fn current_epoch(&self) -> u64 {
        self.lock().generation_epoch
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.current_epoch() == epoch
    }

    /// Start a fresh epoch for a new prompt and return it.
    ///
    /// Everything from the previous epoch, including a successful render, is dropped.
    pub fn begin(&self) -> u64 {
        let mut session = self.lock();
        let epoch = session.generation_epoch + 1;
        *session = Session {
            status: SessionStatus::Generating,
            generation_epoch: epoch,
            ..Session::default()
        };
        epoch
    }

    /// Apply `f` only if `epoch` is still current
    pub fn update<T>(
        &self,
        epoch: u64,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Result<T, Superseded> {
        let mut session = self.lock();
        if session.generation_epoch != epoch {
            return Err(Superseded {
                epoch,
                current: session.generation_epoch,
            });
        }
        Ok(f(&mut session))
    }

    pub fn set_status(&self, epoch: u64, status: SessionStatus) -> Result<(), Superseded> {
        self.update(epoch, |s| s.status = status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_begin_resets_and_bumps_epoch() {
        let cell = SessionCell::new();
        let first = cell.begin();
        cell.update(first, |s| {
            s.current_code = Some("old".to_string());
            s.status = SessionStatus::Succeeded;
            s.attempt = 2;
        })
        .unwrap();

        let second = cell.begin();
        assert_eq!(second, first + 1);

        let session = cell.snapshot();
        assert_eq!(session.current_code, None);
        assert_eq!(session.status, SessionStatus::Generating);
        assert_eq!(session.attempt, 0);
    }

    #[test]
    fn test_stale_update_rejected() {
        let cell = SessionCell::new();
        let stale = cell.begin();
        let current = cell.begin();

        let err = cell
            .update(stale, |s| s.current_code = Some("late".to_string()))
            .unwrap_err();
        assert_eq!(err, Superseded { epoch: stale, current });
        assert_eq!(cell.snapshot().current_code, None);
        assert!(cell.is_current(current));
        assert!(!cell.is_current(stale));
    }

    #[test]
    fn test_fresh_cell_is_idle() {
        let cell = SessionCell::new();
        assert_eq!(cell.snapshot(), Session::default());
        tokio_test::assert_err!(cell.set_status(1, SessionStatus::Failed));
        tokio_test::assert_ok!(cell.set_status(0, SessionStatus::Idle));
    }
}
