//! # Diagnostics
//!
//! Observers of the arm controller's tracking cycles. The controller only produces a
//! [`CycleRecord`] in its status report, it is the executable which hands the record on to an
//! observer after the cycle has completed.
//!
//! The archive observer writes a CSV trace of the first few oscillation periods and keeps a
//! summary of the run (y error at each extremum, minimum obstacle clearance, worst hold errors)
//! which is saved into the session on exit.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{arm_ctrl::ArmCtrlMode, kinematics::CritPointId};
use util::{
    archive::{ArchiveError, Archiver},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Session relative path of the cycle trace.
pub const TRACE_ARCH_PATH: &str = "arm_ctrl_trace.csv";

/// Session relative path of the run summary.
pub const SUMMARY_PATH: &str = "diag/arm_ctrl_summary.json";

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// An observer of tracking cycles.
pub trait CycleObserver {
    /// Called once after each tracking cycle.
    fn on_cycle(&mut self, record: &CycleRecord);

    /// Called once at shutdown.
    fn finish(&mut self, _session: Option<&Session>) {}
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Snapshot of a single tracking cycle.
///
/// Kept flat so that it can be written as a CSV row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    /// Time since tracking began.
    ///
    /// Units: seconds
    pub time_s: f64,

    pub mode: ArmCtrlMode,

    /// Number of trajectory segment switches so far.
    pub num_switches: u64,

    /// Phase of the active segment at the start of the cycle.
    ///
    /// Units: seconds
    pub phase_s: f64,

    // End-effector position of the commanded configuration, meters
    pub ee_x_m: f64,
    pub ee_y_m: f64,
    pub ee_z_m: f64,

    // End-effector position of the measured configuration, meters
    pub meas_ee_x_m: Option<f64>,
    pub meas_ee_y_m: Option<f64>,
    pub meas_ee_z_m: Option<f64>,

    /// Absolute distance of the measured end-effector from the x setpoint.
    ///
    /// Units: meters
    pub hold_error_x_m: Option<f64>,

    /// Absolute distance of the measured end-effector from the z setpoint.
    ///
    /// Units: meters
    pub hold_error_z_m: Option<f64>,

    // End-effector velocity target, meters/second
    pub target_vel_x_ms: f64,
    pub target_vel_y_ms: f64,
    pub target_vel_z_ms: f64,

    /// Units: meters
    pub clearance_m: f64,

    pub closest_point: Option<CritPointId>,

    pub secondary_active: bool,

    /// If the segment was switched on this cycle, the absolute y error of the measured
    /// end-effector from the extremum it just reached.
    ///
    /// Units: meters
    pub extremum_error_m: Option<f64>,
}

/// Summary of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagSummary {
    pub num_cycles: u64,

    pub num_cycles_traced: u64,

    /// Y error at each extremum, in order.
    pub extremum_errors_m: Vec<f64>,

    pub max_extremum_error_m: Option<f64>,

    pub min_clearance_m: Option<f64>,

    pub max_hold_error_x_m: Option<f64>,

    pub max_hold_error_z_m: Option<f64>,

    /// Number of cycles during which the secondary task was active.
    pub num_secondary_cycles: u64,
}

/// Observer archiving the first few oscillation periods and summarising the whole run.
pub struct ArchiveObserver {
    archiver: Archiver,

    /// Records are traced until this many segment switches have occured.
    max_traced_switches: u64,

    trace_failed: bool,

    summary: DiagSummary,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArchiveObserver {
    /// Create a new observer writing its trace into the session's archive directory.
    ///
    /// `num_periods` full oscillations are traced after the initial quarter oscillation.
    pub fn new(session: &Session, num_periods: u64) -> Result<Self, ArchiveError> {
        Ok(Self::from_archiver(
            Archiver::from_path(session, TRACE_ARCH_PATH)?,
            num_periods,
        ))
    }

    /// Create a new observer writing its trace to the given archiver.
    pub fn from_archiver(archiver: Archiver, num_periods: u64) -> Self {
        Self {
            archiver,
            // One switch ends the initial quarter, then two per period
            max_traced_switches: 2 * num_periods + 1,
            trace_failed: false,
            summary: DiagSummary::default(),
        }
    }

    pub fn summary(&self) -> &DiagSummary {
        &self.summary
    }
}

impl CycleObserver for ArchiveObserver {
    fn on_cycle(&mut self, record: &CycleRecord) {
        let s = &mut self.summary;

        s.num_cycles += 1;

        if let Some(e) = record.extremum_error_m {
            s.extremum_errors_m.push(e);
            s.max_extremum_error_m = max_of(s.max_extremum_error_m, Some(e));
        }

        s.min_clearance_m = Some(match s.min_clearance_m {
            Some(c) => c.min(record.clearance_m),
            None => record.clearance_m,
        });
        s.max_hold_error_x_m = max_of(s.max_hold_error_x_m, record.hold_error_x_m);
        s.max_hold_error_z_m = max_of(s.max_hold_error_z_m, record.hold_error_z_m);

        if record.secondary_active {
            s.num_secondary_cycles += 1;
        }

        if self.trace_failed || record.num_switches > self.max_traced_switches {
            return;
        }

        match self.archiver.serialise(record) {
            Ok(()) => s.num_cycles_traced += 1,
            Err(e) => {
                warn!("Could not write the ArmCtrl trace, tracing stopped: {}", e);
                self.trace_failed = true;
            }
        }
    }

    fn finish(&mut self, session: Option<&Session>) {
        let s = &self.summary;

        info!("ArmCtrl run summary:");
        info!("    Cycles: {} ({} traced)", s.num_cycles, s.num_cycles_traced);
        info!("    Extrema reached: {}", s.extremum_errors_m.len());
        if let Some(e) = s.max_extremum_error_m {
            info!("    Max extremum error: {:.6} m", e);
        }
        if let Some(c) = s.min_clearance_m {
            info!("    Min clearance: {:.6} m", c);
        }
        info!("    Secondary task active for {} cycles", s.num_secondary_cycles);

        if let Some(session) = session {
            session.save(SUMMARY_PATH, s.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn max_of(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(num_switches: u64, clearance_m: f64) -> CycleRecord {
        CycleRecord {
            time_s: 0.0,
            mode: ArmCtrlMode::TrackingForward,
            num_switches,
            phase_s: 0.0,
            ee_x_m: 0.6043,
            ee_y_m: 0.0,
            ee_z_m: 0.1508,
            meas_ee_x_m: None,
            meas_ee_y_m: None,
            meas_ee_z_m: None,
            hold_error_x_m: None,
            hold_error_z_m: None,
            target_vel_x_ms: 0.0,
            target_vel_y_ms: 0.1,
            target_vel_z_ms: 0.0,
            clearance_m,
            closest_point: None,
            secondary_active: false,
            extremum_error_m: None,
        }
    }

    #[test]
    fn test_max_of() {
        assert_eq!(max_of(None, None), None);
        assert_eq!(max_of(Some(1.0), None), Some(1.0));
        assert_eq!(max_of(None, Some(2.0)), Some(2.0));
        assert_eq!(max_of(Some(1.0), Some(2.0)), Some(2.0));
    }

    #[test]
    fn test_archive_observer() {
        let path =
            std::env::temp_dir().join(format!("arm_diag_test_{}.csv", std::process::id()));

        // One period traced, so up to 3 switches
        let mut obs = ArchiveObserver::from_archiver(Archiver::from_abs_path(&path).unwrap(), 1);

        obs.on_cycle(&record(0, 1.0));

        let mut r = record(1, 0.04);
        r.extremum_error_m = Some(1e-4);
        r.secondary_active = true;
        r.closest_point = Some(CritPointId::B);
        r.hold_error_x_m = Some(2e-5);
        obs.on_cycle(&r);

        let mut r = record(3, 0.5);
        r.extremum_error_m = Some(3e-4);
        obs.on_cycle(&r);

        // Past the traced periods, summarised only
        let mut r = record(4, 0.3);
        r.extremum_error_m = Some(2e-4);
        obs.on_cycle(&r);

        let s = obs.summary().clone();
        assert_eq!(s.num_cycles, 4);
        assert_eq!(s.num_cycles_traced, 3);
        assert_eq!(s.extremum_errors_m, vec![1e-4, 3e-4, 2e-4]);
        assert_eq!(s.max_extremum_error_m, Some(3e-4));
        assert_eq!(s.min_clearance_m, Some(0.04));
        assert_eq!(s.max_hold_error_x_m, Some(2e-5));
        assert_eq!(s.max_hold_error_z_m, None);
        assert_eq!(s.num_secondary_cycles, 1);

        obs.finish(None);

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("time_s,mode,num_switches,phase_s,ee_x_m"));
        assert!(lines[2].contains("TrackingForward"));
        assert!(lines[2].contains(",B,true,"));
    }
}
