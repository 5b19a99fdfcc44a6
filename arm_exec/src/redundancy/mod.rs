//! # Redundancy resolver
//!
//! Converts a Cartesian end-effector velocity target into joint rates for the 7 joint arm. The
//! primary task holds the end-effector on a line parallel to the y axis while following the
//! trajectory along it. The arm's remaining degrees of freedom are used by a secondary task which
//! pushes the critical point closest to an obstacle away from it in y, harder the closer it gets.
//!
//! The secondary rates are projected into the null space of the end-effector Jacobian, so they
//! never disturb the primary task:
//!
//! ```text
//! qdot = pinv(J) v + kc (I - pinv(J) J) qrdot
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{SMatrix, Vector3, SVD};
use serde::{Deserialize, Serialize};

use crate::{
    kinematics::{CritPoint, Jacobian, JointFrames, JointVector, NUM_JOINTS},
    prox_eval::ClearanceReport,
};

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// Pseudo-inverse of a [`Jacobian`].
pub type JacobianPinv = SMatrix<f64, NUM_JOINTS, 3>;

/// Projector onto the null space of a [`Jacobian`].
pub type NullSpaceProjector = SMatrix<f64, NUM_JOINTS, NUM_JOINTS>;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gains and thresholds of the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverParams {
    /// Proportional gain holding the end-effector on the x and z setpoints.
    pub hold_gain: f64,

    /// Scale applied to `hold_gain` on the x axis.
    pub hold_scale_x: f64,

    /// Scale applied to `hold_gain` on the z axis.
    pub hold_scale_z: f64,

    /// Units: meters
    pub x_setpoint_m: f64,

    /// Units: meters
    pub z_setpoint_m: f64,

    /// Hold errors of this size or smaller are not corrected.
    ///
    /// Units: meters
    pub hold_deadband_m: f64,

    /// Gain of the secondary (obstacle avoidance) task, `kc`.
    pub secondary_gain: f64,

    /// Clearance below which the secondary task is active.
    ///
    /// Units: meters
    pub safe_clearance_m: f64,

    /// Smallest clearance used as the divisor of the repulsion magnitude, so the magnitude stays
    /// finite when a point touches or enters an obstacle.
    ///
    /// Units: meters
    pub repulsion_floor_m: f64,

    /// Singular values below `pinv_eps` times the largest singular value are treated as zero when
    /// computing the pseudo-inverse.
    pub pinv_eps: f64,
}

/// Output of one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Cartesian velocity target of the end-effector.
    ///
    /// Units: meters/second
    pub target_vel_ms: Vector3<f64>,

    /// Joint rates achieving the target, `pinv(J) v`.
    ///
    /// Units: radians/second
    pub primary_rates_rads: JointVector,

    /// Projected and scaled secondary rates, `kc N qrdot`.
    ///
    /// Units: radians/second
    pub secondary_rates_rads: JointVector,

    /// Total commanded joint rates.
    ///
    /// Units: radians/second
    pub rates_rads: JointVector,

    /// True if the secondary task was active.
    pub secondary_active: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RedundancyError {
    #[error("Could not compute the Jacobian pseudo-inverse: {0}")]
    PseudoInverseError(&'static str),

    #[error("The pseudo-inverse cutoff must be non-negative, got {0}")]
    NegativeCutoff(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ResolverParams {
    fn default() -> Self {
        Self {
            hold_gain: 0.5,
            hold_scale_x: 5.0,
            hold_scale_z: 2.0,
            x_setpoint_m: 0.6043,
            z_setpoint_m: 0.1508,
            hold_deadband_m: 1e-5,
            secondary_gain: 4.0,
            safe_clearance_m: 0.056,
            repulsion_floor_m: 0.005,
            pinv_eps: 1e-9,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Resolve the joint rates for the current cycle.
///
/// # Arguments
/// - `frames`: joint frames of the current configuration.
/// - `clearance`: the proximity report for the same configuration.
/// - `traj_vel_ms`: the trajectory velocity along y at the current phase.
pub fn resolve(
    params: &ResolverParams,
    frames: &JointFrames,
    clearance: &ClearanceReport,
    traj_vel_ms: f64,
) -> Result<Resolution, RedundancyError> {
    let jac = frames.ee_jacobian();
    let pinv = pseudo_inverse(&jac, params.pinv_eps)?;

    let target_vel_ms = primary_target(params, &frames.ee_position(), traj_vel_ms);
    let primary_rates_rads = pinv * target_vel_ms;

    // Secondary task, only when an obstacle is too close
    let closest = match clearance.closest {
        Some(c) if clearance.is_below(params.safe_clearance_m) => Some(c),
        _ => None,
    };

    let (secondary_rates_rads, rates_rads) = match closest {
        Some(c) => {
            let qr = repulsion(
                params,
                c.point.point(),
                frames,
                c.obstacle_position_m.y,
                clearance.clearance_m,
            );
            let secondary = params.secondary_gain * (null_space_projector(&jac, &pinv) * qr);

            (secondary, primary_rates_rads + secondary)
        }
        None => (JointVector::zeros(), primary_rates_rads),
    };

    Ok(Resolution {
        target_vel_ms,
        primary_rates_rads,
        secondary_rates_rads,
        rates_rads,
        secondary_active: closest.is_some(),
    })
}

/// Cartesian velocity target of the end-effector.
///
/// x and z are driven back to their setpoints proportionally, y follows the trajectory.
pub fn primary_target(
    params: &ResolverParams,
    ee_position_m: &Vector3<f64>,
    traj_vel_ms: f64,
) -> Vector3<f64> {
    let hold = |pos: f64, setpoint: f64, scale: f64| {
        let err = pos - setpoint;
        if err.abs() > params.hold_deadband_m {
            -scale * params.hold_gain * err
        } else {
            0.0
        }
    };

    Vector3::new(
        hold(ee_position_m.x, params.x_setpoint_m, params.hold_scale_x),
        traj_vel_ms,
        hold(ee_position_m.z, params.z_setpoint_m, params.hold_scale_z),
    )
}

/// Moore-Penrose pseudo-inverse of the Jacobian via SVD.
///
/// Singular values below `eps` times the largest singular value are zeroed, so the result stays
/// bounded near singular configurations whatever the scale of the Jacobian.
pub fn pseudo_inverse(jac: &Jacobian, eps: f64) -> Result<JacobianPinv, RedundancyError> {
    if !(eps >= 0.0) {
        return Err(RedundancyError::NegativeCutoff(eps));
    }

    let svd = SVD::new(*jac, true, true);
    let cutoff = eps * svd.singular_values.max();

    svd.pseudo_inverse(cutoff).map_err(RedundancyError::PseudoInverseError)
}

/// The null space projector `I - pinv(J) J`.
pub fn null_space_projector(jac: &Jacobian, pinv: &JacobianPinv) -> NullSpaceProjector {
    NullSpaceProjector::identity() - pinv * jac
}

/// Joint rates increasing the y separation between a critical point and an obstacle.
///
/// The direction is the gradient of the point's y position with respect to the joint positions,
/// taken from the point's analytic Jacobian and signed away from the obstacle. The magnitude is
///
/// ```text
/// (d_safe - d) / max(d, d_floor)
/// ```
///
/// for a clearance `d`, so the push is zero at the safe clearance and grows as the obstacle closes
/// in. Below the floor it only grows linearly.
pub fn repulsion(
    params: &ResolverParams,
    point: &CritPoint,
    frames: &JointFrames,
    obstacle_y_m: f64,
    clearance_m: f64,
) -> JointVector {
    let p = point.position(frames);
    let grad = point.jacobian(frames).row(1).transpose();

    let grad_norm = grad.norm();
    if grad_norm < f64::EPSILON {
        return JointVector::zeros();
    }

    let away = if p.y >= obstacle_y_m { 1.0 } else { -1.0 };
    let magnitude =
        (params.safe_clearance_m - clearance_m) / clearance_m.max(params.repulsion_floor_m);

    grad * (away * magnitude / grad_norm)
}
