//! Checkpoint coordination.
//!
//! A checkpoint is identified by the host LSN it covers and moves through
//! three states:
//!
//! 1. **requested**: [`CheckpointCoordinator::begin`] asked the engine
//!    scheduler for a checkpoint and created the `snapshot.<lsn>` marker
//! 2. **ready**: the engine reports `scheduler.checkpoint_lsn_last` at or
//!    past the marker's start LSN ([`CheckpointCoordinator::wait`])
//! 3. **retired**: a newer checkpoint was committed and the marker was
//!    destroyed
//!
//! At most one checkpoint is requested at a time, and at most one committed
//! marker is kept alongside it.

use crate::error::{fatal, CoreError, CoreResult};
use crate::types::Lsn;
use lsmbridge_native::{keys, NativeEngine};
use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of [`CheckpointCoordinator::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointStatus {
    /// A checkpoint was requested from the engine.
    Started,
    /// The LSN is already the committed checkpoint; nothing was requested.
    AlreadyExists,
}

/// Bounds on [`CheckpointCoordinator::wait`].
#[derive(Debug, Clone, Default)]
pub struct WaitOptions {
    /// Give up once this much time has passed.
    pub deadline: Option<Duration>,
    /// Give up once the sender publishes `true`. A dropped sender is
    /// treated as "never cancelled".
    pub cancel: Option<watch::Receiver<bool>>,
}

impl WaitOptions {
    /// Waits without bound.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deadline.
    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the cancellation signal.
    #[must_use]
    pub fn cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct CheckpointState {
    pending: Lsn,
    committed: Lsn,
}

/// Tracks the pending and committed checkpoints of an engine handle.
#[derive(Debug)]
pub struct CheckpointCoordinator {
    state: Mutex<CheckpointState>,
    poll_interval: Duration,
}

impl CheckpointCoordinator {
    /// Creates a coordinator with no checkpoints, polling readiness every
    /// `poll_interval`.
    #[must_use]
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            state: Mutex::new(CheckpointState {
                pending: Lsn::NONE,
                committed: Lsn::NONE,
            }),
            poll_interval,
        }
    }

    /// Returns the requested checkpoint, or [`Lsn::NONE`].
    #[must_use]
    pub fn pending(&self) -> Lsn {
        self.state.lock().pending
    }

    /// Returns the last committed checkpoint, or [`Lsn::NONE`].
    #[must_use]
    pub fn committed(&self) -> Lsn {
        self.state.lock().committed
    }

    /// Requests a checkpoint covering `lsn`.
    ///
    /// Requesting the committed checkpoint again is not an error and does
    /// not touch the engine.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLsn` for a negative LSN, `CheckpointInProgress` if a
    /// checkpoint is already requested, or the engine error if the request
    /// or the snapshot marker fails. Nothing is recorded on error.
    pub fn begin(&self, env: &dyn NativeEngine, lsn: Lsn) -> CoreResult<CheckpointStatus> {
        if !lsn.is_some() {
            return Err(CoreError::InvalidLsn(lsn));
        }
        let mut state = self.state.lock();
        if state.pending.is_some() {
            return Err(CoreError::CheckpointInProgress {
                pending: state.pending,
            });
        }
        if lsn == state.committed {
            debug!(%lsn, "checkpoint already exists");
            return Ok(CheckpointStatus::AlreadyExists);
        }

        env.ctl_command(keys::SCHEDULER_CHECKPOINT)?;
        if env.ctl_get(&keys::snapshot(lsn.as_i64()))?.is_none() {
            env.ctl_set(keys::SNAPSHOT, &lsn.to_string())?;
        }
        state.pending = lsn;
        debug!(%lsn, committed = %state.committed, "checkpoint started");
        Ok(CheckpointStatus::Started)
    }

    /// Waits until the engine has completed the requested checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `NoPendingCheckpoint` if nothing is requested,
    /// `CheckpointWaitAborted` if the deadline passes or the wait is
    /// cancelled, or an engine error if readiness cannot be read.
    ///
    /// # Panics
    ///
    /// Panics if the snapshot marker of the requested checkpoint has
    /// disappeared.
    pub async fn wait(&self, env: &dyn NativeEngine, options: WaitOptions) -> CoreResult<()> {
        let lsn = self.pending();
        if !lsn.is_some() {
            return Err(CoreError::NoPendingCheckpoint);
        }

        let WaitOptions {
            deadline,
            mut cancel,
        } = options;
        let started = Instant::now();
        let mut polls = 0u64;

        loop {
            if cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
                warn!(%lsn, polls, "checkpoint wait cancelled");
                return Err(CoreError::CheckpointWaitAborted { lsn, polls });
            }

            polls += 1;
            if is_ready(env, lsn)? {
                debug!(%lsn, polls, "checkpoint ready");
                return Ok(());
            }

            if deadline.is_some_and(|deadline| started.elapsed() >= deadline) {
                warn!(%lsn, polls, "checkpoint wait deadline exceeded");
                return Err(CoreError::CheckpointWaitAborted { lsn, polls });
            }

            let sleep = tokio::time::sleep(self.poll_interval);
            let mut sender_gone = false;
            match cancel.as_mut() {
                Some(rx) => {
                    tokio::select! {
                        () = sleep => {}
                        changed = rx.changed() => sender_gone = changed.is_err(),
                    }
                }
                None => sleep.await,
            }
            if sender_gone {
                cancel = None;
            }
        }
    }

    /// Makes the requested checkpoint the committed one, retiring the
    /// previous committed checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `NoPendingCheckpoint` if nothing is requested, or the engine
    /// error if the previous marker cannot be destroyed.
    ///
    /// # Panics
    ///
    /// Panics if the previous committed marker has disappeared.
    pub fn commit(&self, env: &dyn NativeEngine) -> CoreResult<()> {
        let mut state = self.state.lock();
        if !state.pending.is_some() {
            return Err(CoreError::NoPendingCheckpoint);
        }
        if state.committed.is_some() {
            retire(env, state.committed)?;
        }
        info!(lsn = %state.pending, previous = %state.committed, "checkpoint committed");
        state.committed = state.pending;
        state.pending = Lsn::NONE;
        Ok(())
    }

    /// Abandons the requested checkpoint, if any.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the marker cannot be destroyed; the
    /// checkpoint then stays requested.
    ///
    /// # Panics
    ///
    /// Panics if the marker of the requested checkpoint has disappeared.
    pub fn abort(&self, env: &dyn NativeEngine) -> CoreResult<()> {
        let mut state = self.state.lock();
        if !state.pending.is_some() {
            return Ok(());
        }
        retire(env, state.pending)?;
        info!(lsn = %state.pending, "checkpoint aborted");
        state.pending = Lsn::NONE;
        Ok(())
    }
}

/// Compares the engine's last completed checkpoint with the start LSN of
/// the snapshot marker.
fn is_ready(env: &dyn NativeEngine, lsn: Lsn) -> CoreResult<bool> {
    let start = match env.ctl_get(&keys::snapshot_lsn(lsn.as_i64()))? {
        Some(value) => parse_lsn(keys::snapshot_lsn(lsn.as_i64()).as_str(), &value)?,
        None => fatal(format_args!("snapshot marker for checkpoint {lsn} is missing")),
    };
    let last = match env.ctl_get(keys::CHECKPOINT_LSN_LAST)? {
        Some(value) => parse_lsn(keys::CHECKPOINT_LSN_LAST, &value)?,
        None => {
            return Err(CoreError::engine(format!(
                "{} is not available",
                keys::CHECKPOINT_LSN_LAST
            )))
        }
    };
    Ok(last >= start)
}

fn retire(env: &dyn NativeEngine, lsn: Lsn) -> CoreResult<()> {
    if !env.ctl_delete(&keys::snapshot(lsn.as_i64()))? {
        fatal(format_args!("snapshot marker for checkpoint {lsn} is missing"));
    }
    debug!(%lsn, "snapshot marker retired");
    Ok(())
}

fn parse_lsn(key: &str, value: &str) -> CoreResult<i64> {
    value
        .parse()
        .map_err(|_| CoreError::engine(format!("malformed value for {key}: {value:?}")))
}
