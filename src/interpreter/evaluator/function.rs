use crate::{
    error::RuntimeError,
    interpreter::{evaluator::core::EvalResult, value::core::Value},
};

/// Services calls of user-defined functions made while evaluating a formula.
///
/// The evaluator itself knows nothing about functions: it evaluates the
/// arguments and hands them over. Running the whole callee to completion and
/// suspending the caller until the callee has been stepped through are both
/// expressed as handlers.
pub trait CallHandler {
    /// Calls `name` with already evaluated `arguments`.
    ///
    /// A function that finishes without returning a value yields `未定義`.
    ///
    /// # Errors
    /// `UnknownFunction`, `ArgumentCountMismatch`, or any error raised by the
    /// callee.
    fn call(&mut self, name: &str, arguments: Vec<Value>, line: usize) -> EvalResult<Value>;
}

/// A handler for formulas evaluated outside of any program.
///
/// Every call fails with `UnknownFunction`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCalls;

impl CallHandler for NoCalls {
    fn call(&mut self, name: &str, _arguments: Vec<Value>, line: usize) -> EvalResult<Value> {
        Err(RuntimeError::UnknownFunction { name: name.to_string(),
                                            line })
    }
}
