//! Staged drive to the start posture
//!
//! The elbow is positioned first, then the shoulder and wrist together, with a settling delay
//! before each stage and before tracking is allowed to begin.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::arm::JointId;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Joints commanded at each stage, in order.
const POSTURE_STAGES: [&[JointId]; 2] = [&[JointId::J4], &[JointId::J2, JointId::J6]];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Steps through the posture stages, one call to [`PostureSequencer::step`] per cycle.
#[derive(Debug, Clone, Default)]
pub struct PostureSequencer {
    delay_cycles: u64,

    /// Index of the next stage to command, `POSTURE_STAGES.len()` once every stage has been
    /// commanded.
    next_stage: usize,

    cycles_waited: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Action to take on this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostureStep {
    /// Nothing to command, still settling.
    Wait,

    /// Command the given joints to their start positions.
    Command(&'static [JointId]),

    /// The posture has settled, tracking may begin.
    Ready,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PostureSequencer {
    /// Create a sequencer waiting `stage_delay_s` between stages at the given cycle rate.
    pub fn new(stage_delay_s: f64, cycle_rate_hz: f64) -> Self {
        Self {
            delay_cycles: (stage_delay_s * cycle_rate_hz).round().max(0.0) as u64,
            next_stage: 0,
            cycles_waited: 0,
        }
    }

    /// Number of cycles waited before each stage.
    pub fn delay_cycles(&self) -> u64 {
        self.delay_cycles
    }

    /// Advance by one cycle.
    pub fn step(&mut self) -> PostureStep {
        if self.cycles_waited < self.delay_cycles {
            self.cycles_waited += 1;
            return PostureStep::Wait;
        }

        self.cycles_waited = 0;

        match POSTURE_STAGES.get(self.next_stage) {
            Some(joints) => {
                self.next_stage += 1;
                PostureStep::Command(*joints)
            }
            None => PostureStep::Ready,
        }
    }
}
