use crate::{
    ast::BinaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
};

impl Context<'_> {
    /// Evaluates a bitwise or logical operator.
    ///
    /// `&` and `|` accept two integers or two booleans. `かつ` and `または`
    /// accept booleans only.
    ///
    /// # Errors
    /// `TypeError` when `&` or `|` mixes kinds, `ExpectedBoolean` when a
    /// logical operand is not a boolean.
    pub fn eval_logic(op: BinaryOperator,
                      left: &Value,
                      right: &Value,
                      line: usize)
                      -> EvalResult<Value> {
        use BinaryOperator::{And, BitAnd, BitOr, Or};
        use Value::{Bool, Integer};

        match op {
            BitAnd | BitOr => match (left, right) {
                (Integer(a), Integer(b)) => Ok(Integer(if op == BitAnd { a & b } else { a | b })),
                (Bool(a), Bool(b)) => Ok(Bool(if op == BitAnd { a & b } else { a | b })),
                _ => {
                    Err(RuntimeError::TypeError { details: format!("Cannot use {op} on {} and {}",
                                                                   left.type_name(),
                                                                   right.type_name()),
                                                  line })
                },
            },
            And | Or => {
                let left = left.as_bool(line)?;
                let right = right.as_bool(line)?;
                Ok(Bool(if op == And { left && right } else { left || right }))
            },
            _ => unreachable!("eval_logic used with arithmetic operator"),
        }
    }
}
