use crate::{
    ast::{ComparisonOperator, Expr},
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value::{self},
    },
    util::num::floor_mod,
};

impl Context<'_> {
    /// Evaluates a comparison chain `first op1 x1 op2 x2 ...`.
    ///
    /// Every operand is evaluated exactly once, left to right, before any
    /// relation is tested. The chain holds when every adjacent pair holds.
    ///
    /// # Errors
    /// Any error raised while evaluating an operand or testing a relation.
    pub(crate) fn eval_chain(&mut self,
                             first: &Expr,
                             links: &[(ComparisonOperator, Expr)],
                             line: usize)
                             -> EvalResult<Value> {
        let mut operands = Vec::with_capacity(links.len() + 1);
        operands.push(self.eval(first)?);
        for (_, operand) in links {
            operands.push(self.eval(operand)?);
        }

        let mut holds = true;
        for (pair, (op, _)) in operands.windows(2).zip(links) {
            if !Self::eval_relation(*op, &pair[0], &pair[1], line)? {
                holds = false;
            }
        }
        Ok(Value::Bool(holds))
    }

    /// Tests a single relation between two values.
    ///
    /// Equality compares numbers by value across integer and real, arrays
    /// element by element, and `未定義` only with itself. Ordering relations
    /// require numbers. Divisibility requires integers.
    ///
    /// # Parameters
    /// - `op`: The relation.
    /// - `left`: The left-hand value.
    /// - `right`: The right-hand value.
    /// - `line`: Current line number used for error reporting.
    ///
    /// # Example
    /// ```
    /// use gijigo::{
    ///     ast::ComparisonOperator,
    ///     interpreter::{evaluator::core::Context, value::core::Value},
    /// };
    ///
    /// let a = Value::Integer(3);
    /// let b = Value::Real(5.0);
    ///
    /// assert!(Context::eval_relation(ComparisonOperator::Less, &a, &b, 1).unwrap());
    /// assert!(!Context::eval_relation(ComparisonOperator::Equal, &a, &b, 1).unwrap());
    /// ```
    pub fn eval_relation(op: ComparisonOperator,
                         left: &Value,
                         right: &Value,
                         line: usize)
                         -> EvalResult<bool> {
        use ComparisonOperator::{
            Divisible, Equal, Greater, GreaterEqual, Less, LessEqual, NotDivisible, NotEqual,
        };

        match op {
            Equal => left.loosely_equals(right, line),
            NotEqual => Ok(!left.loosely_equals(right, line)?),
            Divisible | NotDivisible => {
                let divisible = floor_mod(left.as_integer(line)?, right.as_integer(line)?, line)? == 0;
                Ok(divisible == (op == Divisible))
            },
            Less | Greater | LessEqual | GreaterEqual => {
                let ordering = match (left, right) {
                    (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
                    _ if left.is_number() && right.is_number() => {
                        left.as_real(line)?.partial_cmp(&right.as_real(line)?)
                    },
                    _ => return Err(RuntimeError::ExpectedNumber { line }),
                };
                let Some(ordering) = ordering else {
                    return Ok(false);
                };
                Ok(match op {
                    Less => ordering.is_lt(),
                    Greater => ordering.is_gt(),
                    LessEqual => ordering.is_le(),
                    _ => ordering.is_ge(),
                })
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ComparisonOperator::{Divisible, Equal, Less, NotDivisible, NotEqual};

    #[test]
    fn equality_spans_numeric_kinds() {
        assert_eq!(Context::eval_relation(Equal, &2.into(), &Value::Real(2.0), 1), Ok(true));
        assert_eq!(Context::eval_relation(NotEqual, &Value::Undefined, &0.into(), 1), Ok(true));
    }

    #[test]
    fn divisibility_needs_integers() {
        assert_eq!(Context::eval_relation(Divisible, &12.into(), &4.into(), 1), Ok(true));
        assert_eq!(Context::eval_relation(NotDivisible, &12.into(), &5.into(), 1), Ok(true));
        assert_eq!(Context::eval_relation(Divisible, &Value::Real(1.0), &1.into(), 1),
                   Err(RuntimeError::ExpectedInteger { line: 1 }));
        assert_eq!(Context::eval_relation(Divisible, &1.into(), &0.into(), 1),
                   Err(RuntimeError::DivisionByZero { line: 1 }));
    }

    #[test]
    fn ordering_needs_numbers() {
        assert_eq!(Context::eval_relation(Less, &true.into(), &1.into(), 1),
                   Err(RuntimeError::ExpectedNumber { line: 1 }));
        assert_eq!(Context::eval_relation(Less, &Value::Real(f64::NAN), &1.into(), 1), Ok(false));
    }
}
