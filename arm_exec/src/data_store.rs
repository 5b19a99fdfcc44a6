//! # Data Store

use std::time::Instant;

use comms_if::eqpt::arm::JointDems;

use crate::arm_ctrl;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// Start of the previous cycle, `None` before the first cycle.
    pub last_cycle_start: Option<Instant>,

    // ArmCtrl
    pub arm_ctrl: arm_ctrl::ArmCtrl,
    pub arm_ctrl_input: arm_ctrl::InputData,
    pub arm_ctrl_output: Option<JointDems>,
    pub arm_ctrl_status_rpt: arm_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle and measures the interval
    /// since the previous cycle. The first cycle uses the nominal period.
    pub fn cycle_start(&mut self, now: Instant, cycle_period_s: f64) {
        let dt_s = match self.last_cycle_start {
            Some(last) => now.duration_since(last).as_secs_f64(),
            None => cycle_period_s,
        };
        self.last_cycle_start = Some(now);

        self.arm_ctrl_input = arm_ctrl::InputData {
            dt_s,
            ..Default::default()
        };
        self.arm_ctrl_output = None;
        self.arm_ctrl_status_rpt = arm_ctrl::StatusReport::default();
    }
}
