//! Candidate critical points monitored for obstacle proximity
//!
//! Each point lies on the segment between two consecutive joint frame origins and so is rigidly
//! attached to the link of the first frame. The points are stored in a fixed dispatch table whose
//! order is also the traversal order used when searching for the closest point to an obstacle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::{Jacobian, JointFrames, PoseMatrix};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of candidate critical points.
pub const NUM_CRIT_POINTS: usize = 6;

/// Dispatch table of the candidate critical points, in traversal order.
pub const CRIT_POINTS: [CritPoint; NUM_CRIT_POINTS] = [
    CritPoint::new(CritPointId::A, 2, 0.0),
    CritPoint::new(CritPointId::B, 2, 0.5),
    CritPoint::new(CritPointId::C, 3, 0.0),
    CritPoint::new(CritPointId::D, 3, 1.0 / 3.0),
    CritPoint::new(CritPointId::E, 3, 2.0 / 3.0),
    CritPoint::new(CritPointId::F, 3, 1.0),
];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point rigidly attached to one of the arm's links.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CritPoint {
    pub id: CritPointId,

    /// Zero-based index of the joint frame the point is attached to.
    pub link: usize,

    /// Fraction of the way from the link frame origin to the next frame origin.
    pub fraction: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Identifiers of the candidate critical points, from the elbow towards the wrist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CritPointId {
    A,
    B,
    C,
    D,
    E,
    F,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CritPointId {
    /// All points in traversal order.
    pub const ALL: [CritPointId; NUM_CRIT_POINTS] = [
        CritPointId::A,
        CritPointId::B,
        CritPointId::C,
        CritPointId::D,
        CritPointId::E,
        CritPointId::F,
    ];

    /// Position of the point in the traversal order.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The dispatch table entry for this point.
    pub fn point(self) -> &'static CritPoint {
        &CRIT_POINTS[self.index()]
    }
}

impl CritPoint {
    pub const fn new(id: CritPointId, link: usize, fraction: f64) -> Self {
        Self { id, link, fraction }
    }

    /// Number of joints, counted from the base, whose motion moves this point.
    pub fn num_moving_joints(&self) -> usize {
        self.link + 1
    }

    /// Position of the point in the base frame.
    pub fn position(&self, frames: &JointFrames) -> Vector3<f64> {
        let o_a = frames.origin(self.link);
        let o_b = frames.origin(self.link + 1);

        o_a + (o_b - o_a) * self.fraction
    }

    /// Linear velocity Jacobian of the point.
    pub fn jacobian(&self, frames: &JointFrames) -> Jacobian {
        frames.point_jacobian(&self.position(frames), self.num_moving_joints())
    }

    /// Pose of the point, which shares the orientation of its link frame.
    pub fn pose(&self, frames: &JointFrames) -> PoseMatrix {
        let mut pose = *frames.frame(self.link);
        let p = self.position(frames);

        pose[(0, 3)] = p.x;
        pose[(1, 3)] = p.y;
        pose[(2, 3)] = p.z;

        pose
    }
}
