//! # Arm Executable Parameters
//!
//! This module provide parameters for the arm executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::sim::SimParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmExecParams {
    /// Rate of the control loop.
    ///
    /// Units: Hz
    pub cycle_rate_hz: f64,

    /// If true the first oscillations are traced to the session archive.
    pub enable_archive: bool,

    /// Number of full oscillation periods traced when archiving is enabled.
    pub diag_num_periods: u64,

    /// Loopback simulation used with `--sim`.
    pub sim: SimParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ArmExecParams {
    fn default() -> Self {
        Self {
            cycle_rate_hz: 100.0,
            enable_archive: true,
            diag_num_periods: 3,
            sim: SimParams::default(),
        }
    }
}

impl ArmExecParams {
    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub fn cycle_period_s(&self) -> f64 {
        1.0 / self.cycle_rate_hz
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load_exec_params() {
        let params: ArmExecParams = util::params::from_str(
            r#"
            cycle_rate_hz = 50.0

            [[sim.obstacles]]
            centre_m = [0.3, 0.0, 0.0]
            amplitude_m = 0.05
            period_s = 4.0
            "#,
        )
        .unwrap();

        assert_eq!(params.cycle_rate_hz, 50.0);
        assert!((params.cycle_period_s() - 0.02).abs() < 1e-12);
        assert!(params.enable_archive);
        assert_eq!(params.diag_num_periods, 3);
        assert_eq!(params.sim.obstacles.len(), 1);
        assert_eq!(params.sim.obstacles[0].period_s, 4.0);
    }

    #[test]
    fn test_shipped_file() {
        let params: ArmExecParams =
            util::params::from_str(include_str!("../../params/arm_exec.toml")).unwrap();

        assert_eq!(params.cycle_rate_hz, 100.0);
        assert_eq!(params.sim, SimParams::default());
    }
}
