//! # Kinematic model
//!
//! Closed-form forward kinematics of the xArm7 using the modified (Craig) Denavit-Hartenberg
//! convention, together with analytic linear-velocity Jacobians of the end-effector and of the
//! candidate critical points monitored for obstacle proximity.
//!
//! All functions are total over finite joint vectors. No special handling of singular
//! configurations is performed here, that is left to the redundancy resolver.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod crit_points;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Matrix4, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};

pub use comms_if::eqpt::arm::NUM_JOINTS;
pub use crit_points::*;

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// A vector with one element per joint, used for joint positions (radians) and rates
/// (radians/second).
pub type JointVector = SVector<f64, NUM_JOINTS>;

/// Homogeneous transform of a frame relative to the arm base frame.
pub type PoseMatrix = Matrix4<f64>;

/// Linear velocity Jacobian, mapping joint rates to the velocity of a point in the base frame.
pub type Jacobian = SMatrix<f64, 3, NUM_JOINTS>;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Modified DH table of the xArm7, from the base to the flange.
pub const XARM7_DH: [DhLink; NUM_JOINTS] = [
    DhLink::new(0.0, 0.0, 0.267),
    DhLink::new(-std::f64::consts::FRAC_PI_2, 0.0, 0.0),
    DhLink::new(std::f64::consts::FRAC_PI_2, 0.0, 0.293),
    DhLink::new(std::f64::consts::FRAC_PI_2, 0.0525, 0.0),
    DhLink::new(std::f64::consts::FRAC_PI_2, 0.0775, 0.3425),
    DhLink::new(std::f64::consts::FRAC_PI_2, 0.0, 0.0),
    DhLink::new(-std::f64::consts::FRAC_PI_2, 0.076, 0.097),
];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Modified DH parameters of a single link.
///
/// The transform from frame `i-1` to frame `i` is
/// `RotX(alpha) * TransX(a) * RotZ(theta) * TransZ(d)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DhLink {
    /// Link twist, `alpha(i-1)`.
    ///
    /// Units: radians
    pub alpha_rad: f64,

    /// Link length, `a(i-1)`.
    ///
    /// Units: meters
    pub a_m: f64,

    /// Link offset, `d(i)`.
    ///
    /// Units: meters
    pub d_m: f64,
}

/// Kinematic model of a serial 7 joint arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmKinematics {
    links: [DhLink; NUM_JOINTS],
}

/// Poses of every joint frame for one joint configuration.
///
/// Index `k` holds frame `k + 1`, i.e. the frame rotating with joint `k + 1`. The last frame is
/// the end-effector (flange) frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointFrames {
    frames: [PoseMatrix; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Named frames a pose can be requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmFrame {
    /// The frame of the joint with the given zero-based index.
    Joint(usize),

    /// The end-effector frame.
    EndEffector,

    /// A candidate critical point, oriented as the link it is attached to.
    CritPoint(CritPointId),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DhLink {
    pub const fn new(alpha_rad: f64, a_m: f64, d_m: f64) -> Self {
        Self {
            alpha_rad,
            a_m,
            d_m,
        }
    }

    /// Transform from the previous frame into this link's frame for the given joint angle.
    pub fn transform(&self, theta_rad: f64) -> PoseMatrix {
        let (st, ct) = theta_rad.sin_cos();
        let (sa, ca) = self.alpha_rad.sin_cos();

        #[rustfmt::skip]
        let t = PoseMatrix::new(
            ct,      -st,      0.0,  self.a_m,
            st * ca,  ct * ca, -sa,  -sa * self.d_m,
            st * sa,  ct * sa,  ca,   ca * self.d_m,
            0.0,      0.0,      0.0,  1.0,
        );

        t
    }
}

impl Default for ArmKinematics {
    fn default() -> Self {
        Self::new(XARM7_DH)
    }
}

impl ArmKinematics {
    pub fn new(links: [DhLink; NUM_JOINTS]) -> Self {
        Self { links }
    }

    /// Compute the pose of every joint frame.
    pub fn joint_frames(&self, joint_pos_rad: &JointVector) -> JointFrames {
        let mut frames = [PoseMatrix::identity(); NUM_JOINTS];
        let mut pose = PoseMatrix::identity();

        for (i, link) in self.links.iter().enumerate() {
            pose *= link.transform(joint_pos_rad[i]);
            frames[i] = pose;
        }

        JointFrames { frames }
    }

    /// Pose of the given named frame.
    ///
    /// # Panics
    /// - If `ArmFrame::Joint` is given an index of `NUM_JOINTS` or more.
    pub fn pose(&self, joint_pos_rad: &JointVector, frame: ArmFrame) -> PoseMatrix {
        let frames = self.joint_frames(joint_pos_rad);

        match frame {
            ArmFrame::Joint(i) => *frames.frame(i),
            ArmFrame::EndEffector => *frames.end_effector(),
            ArmFrame::CritPoint(id) => id.point().pose(&frames),
        }
    }

    /// Position of the end-effector in the base frame.
    pub fn ee_position(&self, joint_pos_rad: &JointVector) -> Vector3<f64> {
        self.joint_frames(joint_pos_rad).ee_position()
    }

    /// Linear velocity Jacobian of the end-effector.
    pub fn ee_jacobian(&self, joint_pos_rad: &JointVector) -> Jacobian {
        self.joint_frames(joint_pos_rad).ee_jacobian()
    }

    /// Linear velocity Jacobian of a candidate critical point.
    pub fn crit_point_jacobian(&self, joint_pos_rad: &JointVector, id: CritPointId) -> Jacobian {
        id.point().jacobian(&self.joint_frames(joint_pos_rad))
    }
}

impl JointFrames {
    /// Pose of the frame with the given zero-based index.
    pub fn frame(&self, index: usize) -> &PoseMatrix {
        &self.frames[index]
    }

    /// Pose of the end-effector frame.
    pub fn end_effector(&self) -> &PoseMatrix {
        &self.frames[NUM_JOINTS - 1]
    }

    /// Origin of the frame with the given zero-based index.
    pub fn origin(&self, index: usize) -> Vector3<f64> {
        let f = &self.frames[index];
        Vector3::new(f[(0, 3)], f[(1, 3)], f[(2, 3)])
    }

    /// Rotation axis (local z) of the joint with the given zero-based index.
    pub fn axis(&self, index: usize) -> Vector3<f64> {
        let f = &self.frames[index];
        Vector3::new(f[(0, 2)], f[(1, 2)], f[(2, 2)])
    }

    /// Position of the end-effector.
    pub fn ee_position(&self) -> Vector3<f64> {
        self.origin(NUM_JOINTS - 1)
    }

    /// Linear velocity Jacobian of the end-effector.
    pub fn ee_jacobian(&self) -> Jacobian {
        self.point_jacobian(&self.ee_position(), NUM_JOINTS)
    }

    /// Linear velocity Jacobian of a point rigidly attached to the link driven by joint
    /// `num_moving - 1`.
    ///
    /// Column `i` is `z_i x (p - o_i)` for the first `num_moving` joints and zero for the rest,
    /// since joints further along the chain do not move the point.
    pub fn point_jacobian(&self, point: &Vector3<f64>, num_moving: usize) -> Jacobian {
        let mut jac = Jacobian::zeros();

        for i in 0..num_moving.min(NUM_JOINTS) {
            let col = self.axis(i).cross(&(point - self.origin(i)));
            jac.set_column(i, &col);
        }

        jac
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Arm posture the controller starts tracking from.
    pub(crate) fn start_posture() -> JointVector {
        JointVector::from_column_slice(&[0.0, 0.75, 0.0, 1.5, 0.0, 0.75, 0.0])
    }

    fn some_posture() -> JointVector {
        JointVector::from_column_slice(&[0.3, 0.6, -0.4, 1.2, 0.2, 0.9, -0.5])
    }

    /// Finite difference Jacobian of any position function.
    pub(crate) fn numerical_jacobian<F>(q: &JointVector, f: F) -> Jacobian
    where
        F: Fn(&JointVector) -> Vector3<f64>,
    {
        const H: f64 = 1e-6;
        let mut jac = Jacobian::zeros();

        for i in 0..NUM_JOINTS {
            let mut qp = *q;
            let mut qm = *q;
            qp[i] += H;
            qm[i] -= H;
            jac.set_column(i, &((f(&qp) - f(&qm)) / (2.0 * H)));
        }

        jac
    }

    #[test]
    fn test_dh_transform_is_rigid() {
        for link in XARM7_DH.iter() {
            let t = link.transform(0.37);
            let rot = t.fixed_view::<3, 3>(0, 0).into_owned();

            assert!((rot.transpose() * rot - nalgebra::Matrix3::identity()).norm() < 1e-12);
            assert!((rot.determinant() - 1.0).abs() < 1e-12);
            assert_eq!(t.row(3).into_owned(), nalgebra::RowVector4::new(0.0, 0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn test_zero_posture() {
        let kin = ArmKinematics::default();
        let p = kin.ee_position(&JointVector::zeros());

        // Fully extended upwards: shoulder height plus upper arm and forearm offsets
        assert!((p.x - (0.0525 + 0.0775 + 0.076)).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
        assert!((p.z - (0.267 + 0.293 + 0.3425 - 0.097)).abs() < 1e-9);
    }

    #[test]
    fn test_start_posture() {
        let kin = ArmKinematics::default();
        let p = kin.ee_position(&start_posture());

        assert!((p.x - 0.6043).abs() < 1e-4, "x = {}", p.x);
        assert!(p.y.abs() < 1e-9, "y = {}", p.y);
        assert!((p.z - 0.1508).abs() < 1e-4, "z = {}", p.z);
    }

    #[test]
    fn test_pose_frames() {
        let kin = ArmKinematics::default();
        let q = some_posture();
        let frames = kin.joint_frames(&q);

        assert_eq!(kin.pose(&q, ArmFrame::EndEffector), *frames.end_effector());
        assert_eq!(kin.pose(&q, ArmFrame::Joint(2)), *frames.frame(2));

        // Base joint frame only depends on joint 1
        let f0 = kin.pose(&q, ArmFrame::Joint(0));
        assert!((f0[(2, 3)] - 0.267).abs() < 1e-12);
        assert!((f0[(0, 0)] - q[0].cos()).abs() < 1e-12);
    }

    #[test]
    fn test_ee_jacobian_matches_finite_difference() {
        let kin = ArmKinematics::default();

        for q in [start_posture(), some_posture(), JointVector::zeros()].iter() {
            let analytic = kin.ee_jacobian(q);
            let numeric = numerical_jacobian(q, |q| kin.ee_position(q));

            assert!(
                (analytic - numeric).abs().max() < 1e-6,
                "analytic:{}numeric:{}",
                analytic,
                numeric
            );
        }
    }

    #[test]
    fn test_zero_posture_jacobian() {
        let kin = ArmKinematics::default();
        let jac = kin.ee_jacobian(&JointVector::zeros());

        assert!(jac.iter().all(|v| v.is_finite()));

        // Joint 7 rotates about the flange axis, so it cannot move the flange origin
        assert!(jac.column(6).norm() < 1e-12);
    }
}
