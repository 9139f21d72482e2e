use crate::{
    ast::BinaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
    util::num::{floor_div, floor_mod, floor_mod_real},
};

impl Context<'_> {
    /// Evaluates a scalar arithmetic operation.
    ///
    /// Two integers stay integers, with overflow reported instead of
    /// wrapping. A real on either side promotes both operands to real. `/`
    /// always yields a real; `の商` and `mod` round the quotient toward
    /// negative infinity. A real result must be finite.
    ///
    /// # Parameters
    /// - `op`: The arithmetic operator.
    /// - `left`: Left operand.
    /// - `right`: Right operand.
    /// - `line`: Line number for error reporting.
    ///
    /// # Returns
    /// An `EvalResult<Value>` containing the computed number.
    ///
    /// # Errors
    /// `ExpectedNumber` for non-numeric operands, `DivisionByZero`, and
    /// `Overflow`.
    ///
    /// # Example
    /// ```
    /// use gijigo::{
    ///     ast::BinaryOperator,
    ///     interpreter::{evaluator::core::Context, value::core::Value},
    /// };
    ///
    /// let x = Value::Integer(7);
    /// let y = Value::Integer(2);
    ///
    /// let quotient = Context::eval_scalar_op(BinaryOperator::Div, &x, &y, 1).unwrap();
    /// assert_eq!(quotient, Value::Real(3.5));
    ///
    /// let floored = Context::eval_scalar_op(BinaryOperator::FloorDiv, &x, &y, 1).unwrap();
    /// assert_eq!(floored, Value::Integer(3));
    /// ```
    pub fn eval_scalar_op(op: BinaryOperator,
                          left: &Value,
                          right: &Value,
                          line: usize)
                          -> EvalResult<Value> {
        use BinaryOperator::{Add, Div, FloorDiv, Mod, Mul, Sub};
        use Value::{Integer, Real};

        match (left, right) {
            (Integer(a), Integer(b)) if op != Div => {
                let overflow = RuntimeError::Overflow { line };
                Ok(Integer(match op {
                               Add => a.checked_add(*b).ok_or(overflow)?,
                               Sub => a.checked_sub(*b).ok_or(overflow)?,
                               Mul => a.checked_mul(*b).ok_or(overflow)?,
                               FloorDiv => floor_div(*a, *b, line)?,
                               Mod => floor_mod(*a, *b, line)?,
                               _ => unreachable!(),
                           }))
            },
            _ if left.is_number() && right.is_number() => {
                let left = left.as_real(line)?;
                let right = right.as_real(line)?;

                let result = match op {
                    Add => left + right,
                    Sub => left - right,
                    Mul => left * right,
                    Div | FloorDiv => {
                        if right == 0.0 {
                            return Err(RuntimeError::DivisionByZero { line });
                        }
                        if op == Div { left / right } else { (left / right).floor() }
                    },
                    Mod => floor_mod_real(left, right, line)?,
                    _ => unreachable!(),
                };
                if !result.is_finite() {
                    return Err(RuntimeError::Overflow { line });
                }
                Ok(Real(result))
            },
            _ => Err(RuntimeError::ExpectedNumber { line }),
        }
    }
}
