/// Floating point type used for geometry and intermediate math.
pub type Real = f64;

/// Storage type of result buffers.
pub type Value = f32;

/// Marks a result value that could not be meaningfully computed.
pub const UNDEFINED: Value = Value::INFINITY;

/// Guard used for near-zero denominators in per-value formulas.
pub const DENOMINATOR_EPS: Real = 1e-9;

/// Narrow a computed value into storage, mapping NaN and infinities to `UNDEFINED`.
#[inline]
pub fn to_value(v: Real) -> Value {
    let narrowed = v as Value;
    if narrowed.is_finite() {
        narrowed
    } else {
        UNDEFINED
    }
}

/// Divide, returning `None` when the denominator is within `DENOMINATOR_EPS` of zero.
#[inline]
pub fn safe_div(num: Real, den: Real) -> Option<Real> {
    if den.abs() < DENOMINATOR_EPS {
        None
    } else {
        Some(num / den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_round_trip() {
        assert_eq!(to_value(Real::NAN), UNDEFINED);
        assert_eq!(to_value(Real::NEG_INFINITY), UNDEFINED);
        assert_eq!(to_value(2.5), 2.5);
    }

    #[test]
    fn safe_div_guards_zero() {
        assert_eq!(safe_div(1.0, 0.0), None);
        assert_eq!(safe_div(1.0, 1e-12), None);
        assert_eq!(safe_div(4.0, 2.0), Some(2.0));
    }
}
