//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::ArmCtrlError;
use crate::{kinematics::NUM_JOINTS, prox_eval::ProxParams, redundancy::ResolverParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
///
/// Every field has a default, so a parameter file only needs to list the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    // ---- POSTURE ----
    /// Posture the arm is driven to before tracking begins.
    ///
    /// Units: radians
    pub start_posture_rad: [f64; NUM_JOINTS],

    /// Delay between each stage of the drive to the start posture.
    ///
    /// Units: seconds
    pub posture_stage_delay_s: f64,

    // ---- TRAJECTORY ----
    /// Period of a full oscillation of the end-effector.
    ///
    /// Units: seconds
    pub period_s: f64,

    /// Peak displacement of the end-effector along y.
    ///
    /// Units: meters
    pub amplitude_m: f64,

    /// Displacement along y which, once exceeded, starts the return leg.
    ///
    /// Units: meters
    pub switch_threshold_m: f64,

    // ---- OBSTACLES ----
    /// Indices into the model states of the obstacles to avoid.
    pub tracked_model_indices: Vec<usize>,

    /// Proximity evaluation parameters.
    pub prox: ProxParams,

    // ---- RESOLVER ----
    /// Redundancy resolution gains and thresholds.
    pub resolver: ResolverParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            start_posture_rad: [0.0, 0.75, 0.0, 1.5, 0.0, 0.75, 0.0],
            posture_stage_delay_s: 1.0,
            period_s: 5.0,
            amplitude_m: 0.2,
            switch_threshold_m: 0.20001,
            tracked_model_indices: vec![1, 2],
            prox: ProxParams::default(),
            resolver: ResolverParams::default(),
        }
    }
}

impl Params {
    /// Check the parameters describe a usable controller.
    pub fn validate(&self) -> Result<(), ArmCtrlError> {
        let invalid = |msg: &str| Err(ArmCtrlError::InvalidParams(msg.into()));

        if self.start_posture_rad.iter().any(|q| !q.is_finite()) {
            return invalid("start_posture_rad must be finite");
        }
        if !(self.posture_stage_delay_s.is_finite() && self.posture_stage_delay_s >= 0.0) {
            return invalid("posture_stage_delay_s must be finite and non-negative");
        }
        if !(self.amplitude_m.is_finite() && self.amplitude_m > 0.0) {
            return invalid("amplitude_m must be positive");
        }
        if !(self.switch_threshold_m.is_finite() && self.switch_threshold_m > 0.0) {
            return invalid("switch_threshold_m must be positive");
        }
        if !(self.prox.obstacle_radius_m >= 0.0 && self.prox.clearance_ceiling_m.is_finite()) {
            return invalid("prox.obstacle_radius_m must be non-negative and the ceiling finite");
        }
        if !(self.resolver.pinv_eps >= 0.0) {
            return invalid("resolver.pinv_eps must be non-negative");
        }
        if !(self.resolver.repulsion_floor_m.is_finite() && self.resolver.repulsion_floor_m > 0.0) {
            return invalid("resolver.repulsion_floor_m must be positive");
        }
        if !(self.resolver.hold_deadband_m >= 0.0) {
            return invalid("resolver.hold_deadband_m must be non-negative");
        }

        // The period is checked when the trajectory segments are built

        Ok(())
    }
}
