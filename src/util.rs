//! Clamping helpers.
//!
//! Two contracts live here and they are not interchangeable:
//! [`constrain`] fails fast on inverted bounds, [`constrain_lenient`] never
//! fails. Geometry-derived bounds use the former so a broken invariant shows up
//! at the call site; user-entered option values use the latter.

use crate::error::{EngineError, Result};

/// Clamp `value` into `[min, max]`.
///
/// Returns [`EngineError::InvalidRange`] if `min > max`; the bounds are never
/// swapped.
pub fn constrain(value: f64, min: f64, max: f64) -> Result<f64> {
    if min > max {
        return Err(EngineError::InvalidRange { min, max });
    }
    Ok(value.max(min).min(max))
}

/// Clamp `value` into `[min, max]` without ever failing.
///
/// With inverted bounds the result is `max`.
pub fn constrain_lenient(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}
