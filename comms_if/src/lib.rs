//! # Communications interface crate.
//!
//! Provides all common communications interfaces between the arm controller and the
//! middleware carrying sensor data and joint demands.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Message definitions for equipment (the arm and its environment)
pub mod eqpt;

/// Network module
pub mod net;
