//! Recovery state machine.
//!
//! The host recovers in three steps: it loads the last snapshot, replays
//! the write-ahead log, then goes online. Each space tracks where it is in
//! that sequence with a [`SpaceRecovery`] value:
//!
//! ```text
//!   phase           replace    step
//!   NoKeys          Recovery   BeginSnapshot   process start
//!   NoKeys          Recovery   EndSnapshot     snapshot recovery begins
//!   PrimaryKeyOnly  Recovery   EndRecovery     snapshot recovery ends
//!   AllKeys         Live       Noop            recovery complete
//! ```
//!
//! Transitions are pure: [`SpaceRecovery::recover`] returns the next state
//! and never moves the phase backwards.

/// Which indexes of a space are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecoveryPhase {
    /// Nothing is built yet.
    NoKeys,
    /// The primary key is built; secondary keys are not.
    PrimaryKeyOnly,
    /// All keys are built.
    AllKeys,
}

/// How `replace` writes reach the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplaceMode {
    /// Log replay: write directly at the transaction's signature, outside
    /// any native transaction.
    Recovery,
    /// Steady state: write inside the open native transaction.
    Live,
}

/// What the next call to [`SpaceRecovery::recover`] does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoverStep {
    /// Enter snapshot recovery.
    BeginSnapshot,
    /// Finish snapshot recovery; the primary key becomes available.
    EndSnapshot,
    /// Finish log replay; the space goes live.
    EndRecovery,
    /// Recovery is over.
    Noop,
}

/// Recovery state of one space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpaceRecovery {
    /// Built indexes.
    pub phase: RecoveryPhase,
    /// Current replace behavior.
    pub replace: ReplaceMode,
    /// Next recovery step.
    pub step: RecoverStep,
}

impl Default for SpaceRecovery {
    fn default() -> Self {
        Self::initial()
    }
}

impl SpaceRecovery {
    /// State at process start.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            phase: RecoveryPhase::NoKeys,
            replace: ReplaceMode::Recovery,
            step: RecoverStep::BeginSnapshot,
        }
    }

    /// State after recovery has been completed for the whole engine. Spaces
    /// created from now on are live immediately.
    #[must_use]
    pub const fn online() -> Self {
        Self {
            phase: RecoveryPhase::NoKeys,
            replace: ReplaceMode::Live,
            step: RecoverStep::Noop,
        }
    }

    /// Installs the snapshot-recovery handlers, keeping the phase.
    #[must_use]
    pub const fn with_snapshot_handlers(self) -> Self {
        Self {
            phase: self.phase,
            replace: ReplaceMode::Recovery,
            step: RecoverStep::EndSnapshot,
        }
    }

    /// Performs the next recovery step.
    #[must_use]
    pub const fn recover(self) -> Self {
        match self.step {
            RecoverStep::BeginSnapshot => Self {
                step: RecoverStep::EndSnapshot,
                ..self
            },
            RecoverStep::EndSnapshot => Self {
                phase: RecoveryPhase::PrimaryKeyOnly,
                step: RecoverStep::EndRecovery,
                ..self
            },
            RecoverStep::EndRecovery => Self {
                phase: RecoveryPhase::AllKeys,
                replace: ReplaceMode::Live,
                step: RecoverStep::Noop,
            },
            RecoverStep::Noop => self,
        }
    }

    /// Returns true once the space accepts live writes.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self.replace, ReplaceMode::Live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn full_sequence() {
        let start = SpaceRecovery::initial();
        assert_eq!(start.phase, RecoveryPhase::NoKeys);
        assert_eq!(start.replace, ReplaceMode::Recovery);

        let snapshot = start.recover();
        assert_eq!(snapshot.phase, RecoveryPhase::NoKeys);
        assert_eq!(snapshot.step, RecoverStep::EndSnapshot);

        let replay = snapshot.recover();
        assert_eq!(replay.phase, RecoveryPhase::PrimaryKeyOnly);
        assert_eq!(replay.replace, ReplaceMode::Recovery);
        assert_eq!(replay.step, RecoverStep::EndRecovery);

        let live = replay.recover();
        assert_eq!(live.phase, RecoveryPhase::AllKeys);
        assert!(live.is_live());
        assert_eq!(live.step, RecoverStep::Noop);
    }

    #[test]
    fn noop_is_terminal() {
        let mut state = SpaceRecovery::initial();
        for _ in 0..3 {
            state = state.recover();
        }
        let done = state;
        for _ in 0..5 {
            state = state.recover();
        }
        assert_eq!(state, done);
    }

    #[test]
    fn phase_never_regresses() {
        let mut state = SpaceRecovery::initial();
        for _ in 0..10 {
            let next = state.recover();
            assert!(next.phase >= state.phase);
            state = next;
        }
    }

    #[test]
    fn snapshot_handlers_keep_phase() {
        let replay = SpaceRecovery::initial().recover().recover();
        let reinstalled = replay.with_snapshot_handlers();
        assert_eq!(reinstalled.phase, RecoveryPhase::PrimaryKeyOnly);
        assert_eq!(reinstalled.replace, ReplaceMode::Recovery);
        assert_eq!(reinstalled.step, RecoverStep::EndSnapshot);
    }

    #[test]
    fn online_default() {
        let online = SpaceRecovery::online();
        assert!(online.is_live());
        assert_eq!(online.recover(), online);
    }

    #[derive(Debug, Clone, Copy)]
    enum Event {
        Recover,
        SnapshotHandlers,
    }

    fn event() -> impl Strategy<Value = Event> {
        prop_oneof![Just(Event::Recover), Just(Event::SnapshotHandlers)]
    }

    proptest! {
        #[test]
        fn phase_is_monotonic_under_any_event_sequence(
            events in proptest::collection::vec(event(), 0..32)
        ) {
            let mut state = SpaceRecovery::initial();
            for event in events {
                let next = match event {
                    Event::Recover => state.recover(),
                    Event::SnapshotHandlers => state.with_snapshot_handlers(),
                };
                prop_assert!(next.phase >= state.phase);
                state = next;
            }
        }
    }
}
