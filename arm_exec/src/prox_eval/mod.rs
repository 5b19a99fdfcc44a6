//! # Proximity evaluator
//!
//! Finds the candidate critical point on the arm which is closest to any tracked obstacle.
//! Obstacles are modelled as vertical cylinders of fixed radius, so the clearance is the planar
//! (x-y) distance from a point to an obstacle's centre less the obstacle radius.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::kinematics::{CritPointId, JointFrames, CRIT_POINTS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxParams {
    /// Radius of every obstacle.
    ///
    /// Units: meters
    pub obstacle_radius_m: f64,

    /// Initial value of the running minimum. Clearances at or above this value are never
    /// reported.
    ///
    /// Units: meters
    pub clearance_ceiling_m: f64,
}

/// The closest approach between the arm and the obstacles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClearanceReport {
    /// Minimum signed clearance, negative if a point is inside an obstacle.
    ///
    /// Units: meters
    pub clearance_m: f64,

    /// The closest candidate point and obstacle, or `None` if no clearance was below the ceiling.
    pub closest: Option<ClosestPair>,
}

/// An obstacle to evaluate against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Caller assigned identifier, reported back in [`ClosestPair`].
    pub id: usize,

    /// Position of the obstacle's centre.
    ///
    /// Units: meters
    pub position_m: Vector3<f64>,
}

/// The point/obstacle pair which produced the minimum clearance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosestPair {
    pub point: CritPointId,

    /// The [`Obstacle::id`] of the closest obstacle.
    pub obstacle_id: usize,

    /// Position of the obstacle's centre.
    ///
    /// Units: meters
    pub obstacle_position_m: Vector3<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ProxParams {
    fn default() -> Self {
        Self {
            obstacle_radius_m: 0.05,
            clearance_ceiling_m: 1.0,
        }
    }
}

impl Obstacle {
    pub fn new(id: usize, position_m: Vector3<f64>) -> Self {
        Self { id, position_m }
    }
}

impl ClearanceReport {
    /// Returns true if the clearance is strictly below `threshold_m`.
    pub fn is_below(&self, threshold_m: f64) -> bool {
        self.clearance_m < threshold_m
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Evaluate the clearance between the arm and the obstacles.
///
/// Points are visited in dispatch table order and, for each point, obstacles in list order. The
/// running minimum only moves on a strictly smaller clearance, so on a tie the earlier point wins,
/// and for the same point the earlier obstacle wins.
pub fn evaluate(
    params: &ProxParams,
    frames: &JointFrames,
    obstacles: &[Obstacle],
) -> ClearanceReport {
    closest_approach(
        params,
        CRIT_POINTS.iter().map(|p| (p.id, p.position(frames))),
        obstacles,
    )
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Running minimum over the given points, in iteration order.
fn closest_approach<I>(
    params: &ProxParams,
    points: I,
    obstacles: &[Obstacle],
) -> ClearanceReport
where
    I: IntoIterator<Item = (CritPointId, Vector3<f64>)>,
{
    let mut report = ClearanceReport {
        clearance_m: params.clearance_ceiling_m,
        closest: None,
    };

    for (point, p) in points {
        for obs in obstacles {
            let clearance_m = planar_distance(&p, &obs.position_m) - params.obstacle_radius_m;

            if clearance_m < report.clearance_m {
                report.clearance_m = clearance_m;
                report.closest = Some(ClosestPair {
                    point,
                    obstacle_id: obs.id,
                    obstacle_position_m: obs.position_m,
                });
            }
        }
    }

    report
}

fn planar_distance(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kinematics::{ArmKinematics, JointVector};

    /// Obstacles identified by their position in the list.
    fn numbered(positions: &[Vector3<f64>]) -> Vec<Obstacle> {
        positions
            .iter()
            .enumerate()
            .map(|(i, p)| Obstacle::new(i, *p))
            .collect()
    }

    fn start_frames() -> JointFrames {
        ArmKinematics::default().joint_frames(&JointVector::from_column_slice(&[
            0.0, 0.75, 0.0, 1.5, 0.0, 0.75, 0.0,
        ]))
    }

    #[test]
    fn test_no_obstacles() {
        let report = evaluate(&ProxParams::default(), &start_frames(), &[]);

        assert_eq!(report.clearance_m, 1.0);
        assert_eq!(report.closest, None);
    }

    #[test]
    fn test_far_obstacles() {
        let obstacles = numbered(&[Vector3::new(0.3, 2.0, 0.0), Vector3::new(-3.0, 0.0, 0.5)]);
        let report = evaluate(&ProxParams::default(), &start_frames(), &obstacles);

        assert_eq!(report.clearance_m, 1.0);
        assert_eq!(report.closest, None);
        assert!(!report.is_below(0.056));
    }

    #[test]
    fn test_closest_point() {
        let frames = start_frames();
        let e = CritPointId::E.point().position(&frames);

        // Obstacle beside point E, far from the rest of the arm in y
        let obs = Obstacle::new(3, Vector3::new(e.x, 0.09, 0.0));
        let report = evaluate(&ProxParams::default(), &frames, &[obs]);

        let closest = report.closest.unwrap();
        assert_eq!(closest.point, CritPointId::E);
        assert_eq!(closest.obstacle_id, 3);
        assert_eq!(closest.obstacle_position_m, obs.position_m);
        assert!((report.clearance_m - 0.04).abs() < 1e-12);
        assert!(report.is_below(0.056));
    }

    #[test]
    fn test_point_tie_prefers_lower_index() {
        // C and D placed symmetrically about an obstacle on the x axis
        let points = vec![
            (CritPointId::A, Vector3::new(0.0, 0.0, 0.4)),
            (CritPointId::C, Vector3::new(0.2, 0.1, 0.4)),
            (CritPointId::D, Vector3::new(0.2, -0.1, 0.3)),
        ];
        let obs = Obstacle::new(0, Vector3::new(0.3, 0.0, 0.0));

        let report = closest_approach(&ProxParams::default(), points.clone(), &[obs]);
        assert_eq!(report.closest.unwrap().point, CritPointId::C);

        // Swapping the traversal order swaps the winner
        let reversed: Vec<_> = points.into_iter().rev().collect();
        let report = closest_approach(&ProxParams::default(), reversed, &[obs]);
        assert_eq!(report.closest.unwrap().point, CritPointId::D);
    }

    #[test]
    fn test_obstacle_tie_prefers_lower_index() {
        let points = vec![(CritPointId::B, Vector3::new(0.2, 0.0, 0.4))];
        let obstacles = numbered(&[Vector3::new(0.2, 0.15, 0.3), Vector3::new(0.2, -0.15, 0.3)]);

        let report = closest_approach(&ProxParams::default(), points.clone(), &obstacles);
        let closest = report.closest.unwrap();
        assert_eq!(closest.point, CritPointId::B);
        assert_eq!(closest.obstacle_id, 0);
        assert_eq!(closest.obstacle_position_m, obstacles[0].position_m);
        assert!((report.clearance_m - 0.1).abs() < 1e-12);

        // The earlier obstacle in the list wins, whatever its id
        let reversed = [obstacles[1], obstacles[0]];
        let report = closest_approach(&ProxParams::default(), points, &reversed);
        assert_eq!(report.closest.unwrap().obstacle_id, 1);
        assert_eq!(report.closest.unwrap().obstacle_position_m, reversed[0].position_m);
    }

    #[test]
    fn test_ceiling_is_exclusive() {
        let points = vec![(CritPointId::A, Vector3::new(0.0, 0.0, 0.0))];

        // Exactly at the ceiling is not reported
        let obs = Obstacle::new(0, Vector3::new(1.05, 0.0, 0.0));
        let report = closest_approach(&ProxParams::default(), points, &[obs]);
        assert_eq!(report.clearance_m, 1.0);
        assert_eq!(report.closest, None);
    }

    #[test]
    fn test_penetration_is_negative() {
        let frames = start_frames();
        let f = CritPointId::F.point().position(&frames);

        let obstacles = numbered(&[Vector3::new(f.x, 0.01, 1.0)]);
        let report = evaluate(&ProxParams::default(), &frames, &obstacles);

        assert!((report.clearance_m + 0.04).abs() < 1e-12);
        assert_eq!(report.closest.unwrap().point, CritPointId::F);
    }
}
