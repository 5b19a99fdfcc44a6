//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Apply polynomial coefficients to a value.
///
/// Coefficients are ordered from the highest power down to the constant term, so `[2, 0, 1]`
/// represents `2x^2 + 1`. An empty coefficient list evaluates to zero.
pub fn poly_val<T>(value: T, coeffs: &[T]) -> T
where
    T: Float,
{
    // Horner's scheme
    coeffs.iter().fold(T::zero(), |acc, &c| acc * value + c)
}

/// Differentiate a polynomial once.
///
/// Uses the same highest-power-first ordering as [`poly_val`]. The derivative of a constant (or
/// empty) polynomial is the empty polynomial.
pub fn poly_der<T>(coeffs: &[T]) -> Vec<T>
where
    T: Float,
{
    let order = coeffs.len().saturating_sub(1);

    coeffs
        .iter()
        .take(order)
        .enumerate()
        .map(|(i, &c)| c * T::from(order - i).unwrap_or_else(T::nan))
        .collect()
}
