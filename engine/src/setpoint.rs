//! Setpoint commit pipeline state.
//!
//! The pure state machine lives here; the session drives it with the
//! debounce timer and the actual commit requests. Keeping the transitions
//! synchronous makes the ordering rules testable without a runtime.

/// Pipeline phase. `Editing` and `Committing` both show the user's pending
/// value; only `Idle` accepts server-reported setpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetpointPhase {
    Idle,
    Editing,
    Committing,
}

/// What the driver must do after a commit resolves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommitFollowup {
    Settled,
    /// A newer edit superseded the resolved commit; commit it now.
    CommitNext(f64),
}

#[derive(Debug)]
pub struct SetpointState {
    phase: SetpointPhase,
    authoritative: Option<f64>,
    pending: Option<f64>,
    last_committed: Option<f64>,
    edit_serial: u64,
    commit_in_flight: bool,
}

impl Default for SetpointState {
    fn default() -> SetpointState {
        SetpointState::new()
    }
}

impl SetpointState {
    pub fn new() -> SetpointState {
        SetpointState {
            phase: SetpointPhase::Idle,
            authoritative: None,
            pending: None,
            last_committed: None,
            edit_serial: 0,
            commit_in_flight: false,
        }
    }

    pub fn phase(&self) -> SetpointPhase {
        self.phase
    }

    pub fn authoritative(&self) -> Option<f64> {
        self.authoritative
    }

    pub fn last_committed(&self) -> Option<f64> {
        self.last_committed
    }

    /// The value the thermostat card shows: a pending edit wins over the
    /// authoritative server value.
    pub fn display_value(&self) -> Option<f64> {
        self.pending.or(self.authoritative)
    }

    /// User adjusted the setpoint. Replaces any pending value (last write
    /// wins) and restarts the debounce; the returned serial identifies the
    /// edit so a stale timer can be recognized when it fires.
    pub fn begin_edit(&mut self, value: f64) -> u64 {
        self.pending = Some(value);
        self.phase = SetpointPhase::Editing;
        self.edit_serial += 1;
        self.edit_serial
    }

    /// The debounce timer for `serial` fired. Returns the value to commit,
    /// or `None` when the timer is stale (a newer edit restarted it), the
    /// pipeline moved on, or a commit is already in flight — in the last
    /// case the pending value is retained and picked up when the in-flight
    /// commit resolves.
    pub fn debounce_elapsed(&mut self, serial: u64) -> Option<f64> {
        if serial != self.edit_serial
            || self.phase != SetpointPhase::Editing
            || self.commit_in_flight
        {
            return None;
        }
        let value = self.pending?;
        self.phase = SetpointPhase::Committing;
        self.commit_in_flight = true;
        Some(value)
    }

    /// The in-flight commit for `committed` was acknowledged; `authoritative`
    /// is the target the server reports back (it may be clamped).
    pub fn commit_succeeded(&mut self, committed: f64, authoritative: f64) -> CommitFollowup {
        self.commit_in_flight = false;
        self.last_committed = Some(committed);
        self.authoritative = Some(authoritative);
        self.resolve_followup()
    }

    /// The in-flight commit failed. The pending value survives for a manual
    /// retry; there is no automatic retry loop. A newer edit that arrived
    /// during the failed commit still gets its own commit.
    pub fn commit_failed(&mut self) -> CommitFollowup {
        self.commit_in_flight = false;
        if self.phase == SetpointPhase::Committing {
            self.phase = SetpointPhase::Editing;
            return CommitFollowup::Settled;
        }
        self.resolve_followup()
    }

    fn resolve_followup(&mut self) -> CommitFollowup {
        match self.phase {
            SetpointPhase::Committing => {
                self.phase = SetpointPhase::Idle;
                self.pending = None;
                CommitFollowup::Settled
            }
            // A newer edit moved the pipeline back to Editing while the
            // commit was in flight.
            SetpointPhase::Editing => match self.pending {
                Some(next) => {
                    self.phase = SetpointPhase::Committing;
                    self.commit_in_flight = true;
                    CommitFollowup::CommitNext(next)
                }
                None => {
                    self.phase = SetpointPhase::Idle;
                    CommitFollowup::Settled
                }
            },
            SetpointPhase::Idle => CommitFollowup::Settled,
        }
    }

    /// A scheduled poll reported the server-saved target. Applied only when
    /// the pipeline is fully idle, so a poll can never clobber an edit or an
    /// in-flight commit.
    pub fn apply_poll(&mut self, target: f64) -> bool {
        if self.phase != SetpointPhase::Idle || self.commit_in_flight {
            return false;
        }
        self.authoritative = Some(target);
        true
    }
}
