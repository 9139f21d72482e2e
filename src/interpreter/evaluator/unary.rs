use crate::{
    ast::UnaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
};

impl Context<'_> {
    /// Evaluates a unary operation on a value.
    ///
    /// Supported operators:
    /// - `Negate`: numeric negation for integers and reals.
    /// - `Plus`: identity on numbers.
    /// - `Not`: boolean negation.
    ///
    /// # Parameters
    /// - `op`: Unary operator.
    /// - `value`: Input value.
    /// - `line`: Line number for error reporting.
    ///
    /// # Returns
    /// The computed `Value` wrapped in `EvalResult`.
    ///
    /// # Example
    /// ```
    /// use gijigo::{
    ///     ast::UnaryOperator,
    ///     interpreter::{evaluator::core::Context, value::core::Value},
    /// };
    ///
    /// let v = Context::eval_unary(UnaryOperator::Negate, &Value::Integer(5), 1).unwrap();
    /// assert_eq!(v, Value::Integer(-5));
    ///
    /// let v = Context::eval_unary(UnaryOperator::Not, &Value::Bool(false), 1).unwrap();
    /// assert_eq!(v, Value::Bool(true));
    /// ```
    pub fn eval_unary(op: UnaryOperator, value: &Value, line: usize) -> EvalResult<Value> {
        match op {
            UnaryOperator::Negate => match value {
                Value::Integer(n) => {
                    n.checked_neg().map(Value::Integer).ok_or(RuntimeError::Overflow { line })
                },
                Value::Real(r) => Ok(Value::Real(-r)),
                _ => Err(RuntimeError::ExpectedNumber { line }),
            },
            UnaryOperator::Plus if value.is_number() => Ok(value.clone()),
            UnaryOperator::Plus => Err(RuntimeError::ExpectedNumber { line }),
            UnaryOperator::Not => Ok(Value::Bool(!value.as_bool(line)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negation_checks_overflow() {
        assert_eq!(Context::eval_unary(UnaryOperator::Negate, &Value::Integer(i64::MIN), 2),
                   Err(RuntimeError::Overflow { line: 2 }));
        assert_eq!(Context::eval_unary(UnaryOperator::Negate, &Value::Real(1.5), 2),
                   Ok(Value::Real(-1.5)));
    }

    #[test]
    fn operands_must_fit_operator() {
        assert_eq!(Context::eval_unary(UnaryOperator::Plus, &Value::Bool(true), 3),
                   Err(RuntimeError::ExpectedNumber { line: 3 }));
        assert_eq!(Context::eval_unary(UnaryOperator::Not, &Value::Integer(0), 3),
                   Err(RuntimeError::ExpectedBoolean { line: 3 }));
    }
}
