//! # Arm Equipment Messages
//!
//! Sensor data published by the arm middleware (joint encoders and the poses of models in the
//! world) and the joint position demands sent back to it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of joints on the arm.
pub const NUM_JOINTS: usize = 7;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Snapshot of the arm's joint encoders.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct JointState {
    /// Position of each joint, in joint order.
    ///
    /// Units: radians
    pub pos_rad: [f64; NUM_JOINTS],

    /// Rate of each joint, if the middleware provides it.
    ///
    /// Units: radians/second
    #[serde(default)]
    pub rate_rads: Option<[f64; NUM_JOINTS]>,
}

/// Pose of a single model in the world.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelPose {
    /// Name of the model
    pub name: String,

    /// Position of the model's centre in the arm base frame.
    ///
    /// Units: meters
    pub position_m: [f64; 3],
}

/// Snapshot of all models in the world.
///
/// The order of `poses` is fixed by the middleware, so models are identified by their index.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ModelStates {
    pub poses: Vec<ModelPose>,
}

/// Position demands sent to the arm's joint position controllers.
///
/// Joints missing from the map are not commanded.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct JointDems {
    /// The demanded position of each joint.
    ///
    /// Units: radians
    pub pos_rad: BTreeMap<JointId, f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of the arm's joints, from the base to the flange.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone)]
pub enum JointId {
    J1,
    J2,
    J3,
    J4,
    J5,
    J6,
    J7,
}

/// Data published on the arm sensor stream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ArmSensData {
    JointState(JointState),
    ModelStates(ModelStates),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointId {
    /// All joints in joint order.
    pub const ALL: [JointId; NUM_JOINTS] = [
        JointId::J1,
        JointId::J2,
        JointId::J3,
        JointId::J4,
        JointId::J5,
        JointId::J6,
        JointId::J7,
    ];

    /// Zero-based index of the joint.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Get the joint with the given zero-based index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl ModelStates {
    /// Position of the model at the given index, if present.
    pub fn position_of(&self, index: usize) -> Option<[f64; 3]> {
        self.poses.get(index).map(|p| p.position_m)
    }
}

impl JointDems {
    /// Demands commanding every joint.
    pub fn all(pos_rad: &[f64; NUM_JOINTS]) -> Self {
        Self::subset(pos_rad, &JointId::ALL)
    }

    /// Demands commanding only the given joints, taking their values from `pos_rad`.
    pub fn subset(pos_rad: &[f64; NUM_JOINTS], joints: &[JointId]) -> Self {
        Self {
            pos_rad: joints.iter().map(|&j| (j, pos_rad[j.index()])).collect(),
        }
    }

    /// Returns true if every joint is commanded.
    pub fn is_complete(&self) -> bool {
        JointId::ALL.iter().all(|j| self.pos_rad.contains_key(j))
    }
}
