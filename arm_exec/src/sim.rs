//! # Loopback simulation
//!
//! A stand-in for the arm middleware used when no middleware is running. Demanded joint positions
//! are taken as reached immediately and echoed back as the measured joint state, and the world
//! holds a ground plane plus a number of spherical obstacles swinging back and forth along y.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use comms_if::eqpt::arm::{JointDems, JointState, ModelPose, ModelStates, NUM_JOINTS};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the loopback simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Obstacles in the world, in model index order after the ground plane.
    pub obstacles: Vec<SimObstacle>,
}

/// An obstacle oscillating along y about a fixed centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimObstacle {
    /// Units: meters
    pub centre_m: [f64; 3],

    /// Units: meters
    pub amplitude_m: f64,

    /// Units: seconds
    pub period_s: f64,
}

/// The simulated arm and world.
#[derive(Debug, Clone)]
pub struct ArmSim {
    params: SimParams,

    pos_rad: [f64; NUM_JOINTS],

    /// Simulation time, seconds
    time_s: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            obstacles: vec![
                SimObstacle {
                    centre_m: [0.25, 0.2, 0.0],
                    amplitude_m: 0.1,
                    period_s: 8.0,
                },
                SimObstacle {
                    centre_m: [0.45, -0.25, 0.0],
                    amplitude_m: 0.1,
                    period_s: 6.0,
                },
            ],
        }
    }
}

impl SimObstacle {
    /// Position of the obstacle at the given time.
    pub fn position_m(&self, time_s: f64) -> [f64; 3] {
        let mut p = self.centre_m;

        if self.period_s > 0.0 {
            p[1] += self.amplitude_m * (2.0 * PI * time_s / self.period_s).sin();
        }

        p
    }
}

impl ArmSim {
    /// Create a new simulation with the arm at the given joint positions.
    pub fn new(params: SimParams, pos_rad: [f64; NUM_JOINTS]) -> Self {
        Self {
            params,
            pos_rad,
            time_s: 0.0,
        }
    }

    /// Advance the world by `dt_s`.
    pub fn step(&mut self, dt_s: f64) {
        self.time_s += dt_s;
    }

    /// Move the commanded joints to their demanded positions.
    pub fn apply_demands(&mut self, dems: &JointDems) {
        for (id, pos) in dems.pos_rad.iter() {
            self.pos_rad[id.index()] = *pos;
        }
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    pub fn joint_state(&self) -> JointState {
        JointState {
            pos_rad: self.pos_rad,
            rate_rads: None,
        }
    }

    pub fn model_states(&self) -> ModelStates {
        let mut poses = Vec::with_capacity(self.params.obstacles.len() + 1);

        poses.push(ModelPose {
            name: String::from("ground_plane"),
            position_m: [0.0; 3],
        });

        for (i, obs) in self.params.obstacles.iter().enumerate() {
            poses.push(ModelPose {
                name: format!("obstacle_{}", i + 1),
                position_m: obs.position_m(self.time_s),
            });
        }

        ModelStates { poses }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::arm::JointId;

    #[test]
    fn test_loopback() {
        let mut sim = ArmSim::new(SimParams::default(), [0.0; NUM_JOINTS]);

        let start = [0.0, 0.75, 0.0, 1.5, 0.0, 0.75, 0.0];
        sim.apply_demands(&JointDems::subset(&start, &[JointId::J4]));

        let js = sim.joint_state();
        assert_eq!(js.pos_rad, [0.0, 0.0, 0.0, 1.5, 0.0, 0.0, 0.0]);
        assert_eq!(js.rate_rads, None);

        sim.apply_demands(&JointDems::all(&start));
        assert_eq!(sim.joint_state().pos_rad, start);
    }

    #[test]
    fn test_obstacles() {
        let mut sim = ArmSim::new(SimParams::default(), [0.0; NUM_JOINTS]);

        // Ground plane first, then the obstacles at their centres
        let ms = sim.model_states();
        assert_eq!(ms.poses.len(), 3);
        assert_eq!(ms.position_of(0), Some([0.0; 3]));
        assert_eq!(ms.position_of(1), Some([0.25, 0.2, 0.0]));

        // Quarter of the first obstacle's period puts it at its peak
        sim.step(2.0);
        let p = sim.model_states().position_of(1).unwrap();
        assert!((p[1] - 0.3).abs() < 1e-12);
        assert_eq!(p[0], 0.25);
        assert_eq!(sim.time_s(), 2.0);
    }
}
