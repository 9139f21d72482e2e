use std::{fmt, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::{
    ast::LiteralValue,
    error::RuntimeError,
    interpreter::evaluator::core::EvalResult,
    util::num::i64_to_f64_checked,
};

/// Represents a runtime value.
///
/// Arrays are reference counted and copied on write, so assigning or passing
/// an array behaves like passing a copy while reads stay cheap. Nested arrays
/// model multi-dimensional arrays; there is no separate matrix type.
///
/// In a program record values are plain JSON: numbers, booleans, nested
/// arrays, and `null` for `未定義`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A 64-bit signed integer.
    Integer(i64),
    /// A 64-bit float.
    Real(f64),
    /// `true` or `false`.
    Bool(bool),
    /// An ordered sequence of values.
    Array(Rc<Vec<Self>>),
    /// `未定義`, the value of a declared but unassigned variable.
    Undefined,
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec<Self>> for Value {
    fn from(v: Vec<Self>) -> Self {
        Self::Array(Rc::new(v))
    }
}

impl From<LiteralValue> for Value {
    fn from(literal: LiteralValue) -> Self {
        match literal {
            LiteralValue::Integer(i) => Self::Integer(i),
            LiteralValue::Real(r) => Self::Real(r),
            LiteralValue::Bool(b) => Self::Bool(b),
            LiteralValue::Undefined => Self::Undefined,
        }
    }
}

impl Value {
    /// Returns the numeric value as a float, promoting integers.
    ///
    /// # Errors
    /// `ExpectedNumber` for non-numbers, `Overflow` for integers a float
    /// cannot hold exactly.
    pub fn as_real(&self, line: usize) -> EvalResult<f64> {
        match self {
            Self::Real(r) => Ok(*r),
            Self::Integer(n) => i64_to_f64_checked(*n, line),
            _ => Err(RuntimeError::ExpectedNumber { line }),
        }
    }
    /// Returns the integer value.
    ///
    /// # Errors
    /// `ExpectedInteger` for anything but an integer.
    pub const fn as_integer(&self, line: usize) -> EvalResult<i64> {
        match self {
            Self::Integer(n) => Ok(*n),
            _ => Err(RuntimeError::ExpectedInteger { line }),
        }
    }
    /// Returns the boolean value.
    ///
    /// # Errors
    /// `ExpectedBoolean` for anything but a boolean.
    pub const fn as_bool(&self, line: usize) -> EvalResult<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => Err(RuntimeError::ExpectedBoolean { line }),
        }
    }
    /// Returns the elements of an array.
    ///
    /// # Errors
    /// `ExpectedArray` for anything but an array.
    pub fn as_vec(&self, line: usize) -> EvalResult<&Vec<Self>> {
        match self {
            Self::Array(v) => Ok(v),
            _ => Err(RuntimeError::ExpectedArray { line }),
        }
    }

    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array(..))
    }

    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Self::Integer(..) | Self::Real(..))
    }

    /// Returns a short name of the value's kind for error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Bool(_) => "boolean",
            Self::Array(_) => "array",
            Self::Undefined => "undefined",
        }
    }

    /// Compares two values for equality as the `=` operator does.
    ///
    /// Numbers compare by value across integer and real. Arrays compare
    /// element by element. `未定義` equals only itself. Values of different
    /// kinds are unequal.
    ///
    /// # Errors
    /// `Overflow` when an integer must be promoted but cannot be represented
    /// exactly as a float.
    #[allow(clippy::float_cmp)]
    pub fn loosely_equals(&self, other: &Self, line: usize) -> EvalResult<bool> {
        use Value::{Array, Integer, Real};

        match (self, other) {
            (Integer(_), Real(_)) | (Real(_), Integer(_)) => {
                Ok(self.as_real(line)? == other.as_real(line)?)
            },
            (Array(left), Array(right)) => {
                if left.len() != right.len() {
                    return Ok(false);
                }
                for (l, r) in left.iter().zip(right.iter()) {
                    if !l.loosely_equals(r, line)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            },
            _ => Ok(self == other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(r) if r.is_finite() && r.fract() == 0.0 => write!(f, "{r:.1}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Array(a) => {
                write!(f, "{{")?;

                for (index, value) in a.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }

                    write!(f, "{value}")?;
                }

                write!(f, "}}")
            },
            Self::Undefined => write!(f, "未定義"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_source_notation() {
        let nested = Value::from(vec![Value::from(vec![1.into(), 2.into()]),
                                      Value::from(vec![Value::Real(2.5), Value::Undefined])]);
        assert_eq!(nested.to_string(), "{{1, 2}, {2.5, 未定義}}");
        assert_eq!(Value::Real(3.0).to_string(), "3.0");
    }

    #[test]
    fn numbers_compare_across_kinds() {
        assert!(Value::Integer(2).loosely_equals(&Value::Real(2.0), 1).unwrap());
        assert!(!Value::Integer(2).loosely_equals(&Value::Bool(true), 1).unwrap());
        assert!(Value::Undefined.loosely_equals(&Value::Undefined, 1).unwrap());
        assert!(!Value::Integer(0).loosely_equals(&Value::Undefined, 1).unwrap());
    }

    #[test]
    fn json_form_is_plain() {
        let value = Value::from(vec![1.into(), Value::Real(0.5), true.into(), Value::Undefined]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, "[1,0.5,true,null]");
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
