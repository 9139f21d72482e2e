use crate::{error::RuntimeError, interpreter::evaluator::core::EvalResult};

/// Largest integer magnitude exactly representable as an `f64` (`2^53 - 1`).
pub const MAX_SAFE_U64_INT: u64 = 9_007_199_254_740_991;

/// Safely converts an `i64` to `f64` if and only if it is exactly
/// representable.
///
/// ## Errors
/// Returns `RuntimeError::Overflow` if the value exceeds `MAX_SAFE_U64_INT` in
/// absolute value.
///
/// ## Example
/// ```
/// use gijigo::util::num::{MAX_SAFE_U64_INT, i64_to_f64_checked};
///
/// assert_eq!(i64_to_f64_checked(42, 1).unwrap(), 42.0);
///
/// let big = MAX_SAFE_U64_INT as i64 + 1;
/// assert!(i64_to_f64_checked(big, 1).is_err());
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn i64_to_f64_checked(value: i64, line: usize) -> EvalResult<f64> {
    if value.unsigned_abs() > MAX_SAFE_U64_INT {
        return Err(RuntimeError::Overflow { line });
    }
    Ok(value as f64)
}

/// Converts a length or count to an `i64`.
///
/// ## Errors
/// Returns `RuntimeError::Overflow` if the value does not fit.
pub fn usize_to_i64_checked(value: usize, line: usize) -> EvalResult<i64> {
    i64::try_from(value).map_err(|_| RuntimeError::Overflow { line })
}

/// Floored integer division: the quotient is rounded toward negative
/// infinity.
///
/// ## Errors
/// - `RuntimeError::DivisionByZero` if `divisor` is zero.
/// - `RuntimeError::Overflow` for `i64::MIN / -1`.
///
/// ## Example
/// ```
/// use gijigo::util::num::floor_div;
///
/// assert_eq!(floor_div(7, 2, 1).unwrap(), 3);
/// assert_eq!(floor_div(-7, 2, 1).unwrap(), -4);
/// ```
pub fn floor_div(dividend: i64, divisor: i64, line: usize) -> EvalResult<i64> {
    if divisor == 0 {
        return Err(RuntimeError::DivisionByZero { line });
    }
    let quotient = dividend.checked_div(divisor).ok_or(RuntimeError::Overflow { line })?;
    if dividend % divisor != 0 && ((dividend < 0) != (divisor < 0)) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}

/// Floored remainder: the result takes the sign of the divisor.
///
/// ## Errors
/// Returns `RuntimeError::DivisionByZero` if `divisor` is zero.
///
/// ## Example
/// ```
/// use gijigo::util::num::floor_mod;
///
/// assert_eq!(floor_mod(7, 3, 1).unwrap(), 1);
/// assert_eq!(floor_mod(-7, 3, 1).unwrap(), 2);
/// assert_eq!(floor_mod(7, -3, 1).unwrap(), -2);
/// ```
pub fn floor_mod(dividend: i64, divisor: i64, line: usize) -> EvalResult<i64> {
    if divisor == 0 {
        return Err(RuntimeError::DivisionByZero { line });
    }
    let remainder = dividend.checked_rem(divisor).unwrap_or(0);
    if remainder != 0 && ((remainder < 0) != (divisor < 0)) {
        Ok(remainder + divisor)
    } else {
        Ok(remainder)
    }
}

/// Floored remainder of two reals, with the sign of the divisor.
///
/// ## Errors
/// Returns `RuntimeError::DivisionByZero` if `divisor` is zero.
pub fn floor_mod_real(dividend: f64, divisor: f64, line: usize) -> EvalResult<f64> {
    if divisor == 0.0 {
        return Err(RuntimeError::DivisionByZero { line });
    }
    let remainder = dividend % divisor;
    if remainder != 0.0 && ((remainder < 0.0) != (divisor < 0.0)) {
        Ok(remainder + divisor)
    } else {
        Ok(remainder)
    }
}

/// Converts a 1-based index into an offset into a sequence of length `len`.
///
/// ## Errors
/// Returns `RuntimeError::IndexOutOfBounds` unless `1 <= index <= len`.
///
/// ## Example
/// ```
/// use gijigo::util::num::index_to_offset;
///
/// assert_eq!(index_to_offset(1, 3, 1).unwrap(), 0);
/// assert!(index_to_offset(0, 3, 1).is_err());
/// assert!(index_to_offset(4, 3, 1).is_err());
/// ```
pub fn index_to_offset(index: i64, len: usize, line: usize) -> EvalResult<usize> {
    usize::try_from(index).ok()
                          .filter(|&i| i >= 1 && i <= len)
                          .map(|i| i - 1)
                          .ok_or(RuntimeError::IndexOutOfBounds { max: len,
                                                                  found: index,
                                                                  line })
}
