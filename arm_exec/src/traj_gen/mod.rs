//! # Trajectory generator
//!
//! Quintic polynomial segments along a single Cartesian axis. A segment is defined by the
//! position, velocity and acceleration at both of its ends and by its duration. The six boundary
//! conditions give a unique polynomial whose coefficients are solved once, when the segment is
//! built, and then evaluated every cycle.
//!
//! The lower three coefficients follow directly from the start conditions, the upper three are
//! found by a 3x3 linear solve against the end conditions.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use util::maths::{poly_der, poly_val};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of coefficients of a quintic polynomial.
pub const NUM_QUINTIC_COEFFS: usize = 6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State at one end of a segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryState {
    /// Units: meters
    pub pos_m: f64,

    /// Units: meters/second
    pub vel_ms: f64,

    /// Units: meters/second^2
    pub acc_mss: f64,
}

/// A quintic polynomial in time, valid from `t = 0` to `t = duration_s`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuinticPoly {
    /// Coefficients from the fifth power down to the constant term.
    coeffs: [f64; NUM_QUINTIC_COEFFS],

    /// Coefficients of the first derivative, same ordering.
    vel_coeffs: Vec<f64>,

    /// Coefficients of the second derivative, same ordering.
    acc_coeffs: Vec<f64>,

    /// Units: seconds
    duration_s: f64,
}

/// A polynomial and the time elapsed since it became active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajSegment {
    poly: QuinticPoly,

    /// Units: seconds
    phase_s: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when building a segment.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TrajGenError {
    #[error("Segment duration must be positive and finite, found {0} s")]
    InvalidDuration(f64),

    #[error("Segment boundary conditions must be finite, found start {0:?} and end {1:?}")]
    InvalidBoundary(BoundaryState, BoundaryState),

    #[error("Could not solve for the segment coefficients")]
    Unsolvable,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl BoundaryState {
    /// A state at rest at the given position.
    pub fn at_rest(pos_m: f64) -> Self {
        Self {
            pos_m,
            ..Default::default()
        }
    }

    fn is_finite(&self) -> bool {
        self.pos_m.is_finite() && self.vel_ms.is_finite() && self.acc_mss.is_finite()
    }
}

impl QuinticPoly {
    /// Solve the polynomial joining `start` to `end` over `duration_s` seconds.
    pub fn new(
        start: BoundaryState,
        end: BoundaryState,
        duration_s: f64,
    ) -> Result<Self, TrajGenError> {
        if !(duration_s.is_finite() && duration_s > 0.0) {
            return Err(TrajGenError::InvalidDuration(duration_s));
        }
        if !(start.is_finite() && end.is_finite()) {
            return Err(TrajGenError::InvalidBoundary(start, end));
        }

        let t = duration_s;

        // Lower coefficients come straight from the start conditions
        let a0 = start.pos_m;
        let a1 = start.vel_ms;
        let a2 = 0.5 * start.acc_mss;

        #[rustfmt::skip]
        let m = Matrix3::new(
            t.powi(3),       t.powi(4),        t.powi(5),
            3.0 * t.powi(2), 4.0 * t.powi(3),  5.0 * t.powi(4),
            6.0 * t,         12.0 * t.powi(2), 20.0 * t.powi(3),
        );
        let b = Vector3::new(
            end.pos_m - (a0 + a1 * t + a2 * t.powi(2)),
            end.vel_ms - (a1 + 2.0 * a2 * t),
            end.acc_mss - 2.0 * a2,
        );

        let upper = m.lu().solve(&b).ok_or(TrajGenError::Unsolvable)?;

        let coeffs = [upper[2], upper[1], upper[0], a2, a1, a0];
        if coeffs.iter().any(|c| !c.is_finite()) {
            return Err(TrajGenError::Unsolvable);
        }

        let vel_coeffs = poly_der(&coeffs);
        let acc_coeffs = poly_der(&vel_coeffs);

        Ok(Self {
            coeffs,
            vel_coeffs,
            acc_coeffs,
            duration_s,
        })
    }

    /// Polynomial moving from rest at `start_pos_m` to rest at `end_pos_m`.
    pub fn rest_to_rest(
        start_pos_m: f64,
        end_pos_m: f64,
        duration_s: f64,
    ) -> Result<Self, TrajGenError> {
        Self::new(
            BoundaryState::at_rest(start_pos_m),
            BoundaryState::at_rest(end_pos_m),
            duration_s,
        )
    }

    /// Coefficients from the fifth power down to the constant term.
    pub fn coeffs(&self) -> &[f64; NUM_QUINTIC_COEFFS] {
        &self.coeffs
    }

    pub fn duration_s(&self) -> f64 {
        self.duration_s
    }

    /// Position at time `t_s`.
    ///
    /// The polynomial is evaluated as is outside of the valid window.
    pub fn position(&self, t_s: f64) -> f64 {
        poly_val(t_s, &self.coeffs)
    }

    /// Velocity at time `t_s`.
    pub fn velocity(&self, t_s: f64) -> f64 {
        poly_val(t_s, &self.vel_coeffs)
    }

    /// Acceleration at time `t_s`.
    pub fn acceleration(&self, t_s: f64) -> f64 {
        poly_val(t_s, &self.acc_coeffs)
    }
}

impl TrajSegment {
    /// Start a new segment with its phase at zero.
    pub fn new(poly: QuinticPoly) -> Self {
        Self { poly, phase_s: 0.0 }
    }

    pub fn poly(&self) -> &QuinticPoly {
        &self.poly
    }

    /// Time elapsed since the segment started.
    pub fn phase_s(&self) -> f64 {
        self.phase_s
    }

    /// Advance the phase by `dt_s`.
    pub fn advance(&mut self, dt_s: f64) {
        self.phase_s += dt_s;
    }

    /// True once the phase has passed the end of the polynomial.
    pub fn is_expired(&self) -> bool {
        self.phase_s > self.poly.duration_s()
    }

    /// Position at the current phase.
    pub fn position(&self) -> f64 {
        self.poly.position(self.phase_s)
    }

    /// Velocity at the current phase.
    pub fn velocity(&self) -> f64 {
        self.poly.velocity(self.phase_s)
    }

    /// Acceleration at the current phase.
    pub fn acceleration(&self) -> f64 {
        self.poly.acceleration(self.phase_s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TOL: f64 = 1e-9;

    fn check_boundaries(poly: &QuinticPoly, start: &BoundaryState, end: &BoundaryState) {
        let t = poly.duration_s();

        assert!((poly.position(0.0) - start.pos_m).abs() < TOL);
        assert!((poly.velocity(0.0) - start.vel_ms).abs() < TOL);
        assert!((poly.acceleration(0.0) - start.acc_mss).abs() < TOL);

        assert!((poly.position(t) - end.pos_m).abs() < TOL, "{}", poly.position(t));
        assert!((poly.velocity(t) - end.vel_ms).abs() < TOL, "{}", poly.velocity(t));
        assert!((poly.acceleration(t) - end.acc_mss).abs() < TOL);
    }

    #[test]
    fn test_rest_to_rest_boundaries() {
        for &(start, end, t) in [(0.0, 0.2, 1.25), (0.2, -0.2, 2.5), (-0.2, 0.2, 2.5)].iter() {
            let poly = QuinticPoly::rest_to_rest(start, end, t).unwrap();
            check_boundaries(
                &poly,
                &BoundaryState::at_rest(start),
                &BoundaryState::at_rest(end),
            );
        }
    }

    #[test]
    fn test_rest_to_rest_closed_form() {
        // x(t) = x0 + dx (10 s^3 - 15 s^4 + 6 s^5) with s = t / T
        let t = 1.25;
        let dx = 0.2;
        let poly = QuinticPoly::rest_to_rest(0.0, dx, t).unwrap();
        let c = poly.coeffs();

        assert!((c[0] - 6.0 * dx / t.powi(5)).abs() < TOL);
        assert!((c[1] + 15.0 * dx / t.powi(4)).abs() < TOL);
        assert!((c[2] - 10.0 * dx / t.powi(3)).abs() < TOL);
        assert_eq!(&c[3..], &[0.0, 0.0, 0.0]);

        // Peak velocity at the midpoint is 15/8 of the mean velocity
        assert!((poly.velocity(t / 2.0) - 1.875 * dx / t).abs() < TOL);
    }

    #[test]
    fn test_general_boundaries() {
        let start = BoundaryState {
            pos_m: -0.1,
            vel_ms: 0.3,
            acc_mss: -0.5,
        };
        let end = BoundaryState {
            pos_m: 0.4,
            vel_ms: -0.2,
            acc_mss: 1.0,
        };

        let poly = QuinticPoly::new(start, end, 2.0).unwrap();
        check_boundaries(&poly, &start, &end);
    }

    #[test]
    fn test_invalid_duration() {
        for &t in [0.0, -1.0, std::f64::NAN, std::f64::INFINITY].iter() {
            match QuinticPoly::rest_to_rest(0.0, 0.2, t) {
                Err(TrajGenError::InvalidDuration(_)) => (),
                r => panic!("Expected InvalidDuration for {}, got {:?}", t, r),
            }
        }
    }

    #[test]
    fn test_invalid_boundary() {
        assert!(matches!(
            QuinticPoly::rest_to_rest(std::f64::NAN, 0.2, 1.0),
            Err(TrajGenError::InvalidBoundary(..))
        ));
    }

    #[test]
    fn test_segment_phase() {
        let mut seg = TrajSegment::new(QuinticPoly::rest_to_rest(0.2, -0.2, 2.5).unwrap());

        assert_eq!(seg.phase_s(), 0.0);
        assert!((seg.position() - 0.2).abs() < TOL);

        for _ in 0..125 {
            seg.advance(0.01);
        }

        assert!((seg.phase_s() - 1.25).abs() < 1e-12);
        assert!(seg.position().abs() < 1e-9);
        assert!(seg.velocity() < 0.0);
        assert!(!seg.is_expired());

        seg.advance(1.3);
        assert!(seg.is_expired());
    }
}
