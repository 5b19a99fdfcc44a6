//! # Arm control module
//!
//! Arm control drives the end-effector of the xArm7 back and forth along the y axis while using
//! the arm's redundant degree of freedom to keep its links clear of moving obstacles.
//!
//! On start the arm is first driven, one stage at a time, to a fixed posture. Tracking then
//! begins with a quarter oscillation from the centre out to `+amplitude`, after which the
//! controller alternates between a backward leg (`+amplitude` to `-amplitude`) and a forward leg.
//! A leg is replaced, and its phase clock reset, as soon as the end-effector passes the switch
//! threshold in the direction of travel.
//!
//! Each tracking cycle:
//!  1. Computes the kinematics of the commanded configuration.
//!  1. Evaluates the clearance to the tracked obstacles.
//!  1. Resolves the joint rates for the trajectory velocity at the current phase.
//!  1. Integrates the rates over the cycle interval and outputs the new joint positions.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod posture;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use posture::*;
pub use state::*;

use crate::{redundancy::RedundancyError, traj_gen::TrajGenError};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ArmCtrlError {
    #[error("Invalid ArmCtrl parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid cycle rate, expected a positive value but found {0} Hz")]
    InvalidCycleRate(f64),

    #[error("Could not build the trajectory segments: {0}")]
    TrajGenError(#[from] TrajGenError),

    #[error("Invalid cycle interval, expected a finite non-negative value but found {0} s")]
    InvalidInterval(f64),

    #[error("Redundancy resolution failed: {0}")]
    RedundancyError(#[from] RedundancyError),
}

/// The possible modes of execution of ArmCtrl. Each mode is handled by a `mode_xyz` function.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ArmCtrlMode {
    /// Driving to the start posture.
    AwaitingStart,

    /// End-effector y displacement increasing.
    TrackingForward,

    /// End-effector y displacement decreasing.
    TrackingBackward,
}

impl Default for ArmCtrlMode {
    fn default() -> Self {
        ArmCtrlMode::AwaitingStart
    }
}
