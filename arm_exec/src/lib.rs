//! # Arm library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to access items defined
//! inside the arm crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm control module - drives the end-effector oscillation and avoids obstacles
pub mod arm_ctrl;

/// Data store - holds the executable's per-cycle data
pub mod data_store;

/// Diagnostics - observers of the arm controller's tracking cycles
pub mod diag;

/// Kinematics - forward kinematics and Jacobians of the xArm7
pub mod kinematics;

/// Mechanisms client - publishes joint demands to the arm middleware
pub mod mech_client;

/// Executable parameters
pub mod params;

/// Proximity evaluation - clearance between the arm and the obstacles
pub mod prox_eval;

/// Redundancy resolution - joint rates from the end-effector velocity and the secondary task
pub mod redundancy;

/// Sensor client - receives joint and model states from the arm middleware
pub mod sens_client;

/// Loopback simulation - stands in for the arm middleware
pub mod sim;

/// Trajectory generation - quintic polynomial segments
pub mod traj_gen;
