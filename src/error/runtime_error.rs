use crate::error::LtsError;

/// Represents all errors that can occur while executing a compiled program.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Tried to read a variable that is not bound.
    #[error("Error on line {line}: '{name}' is not defined as a variable.")]
    UnknownVariable {
        /// The name of the variable.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// Called a function that is not defined.
    #[error("Error on line {line}: Unknown function '{name}'.")]
    UnknownFunction {
        /// The name of the function.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A value had an unexpected or incompatible type.
    #[error("Error on line {line}: Type error: {details}.")]
    TypeError {
        /// Details about the type mismatch.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A boolean value was expected, but not found.
    #[error("Error on line {line}: Expected boolean.")]
    ExpectedBoolean {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A numeric value was expected, but not found.
    #[error("Error on line {line}: Expected number.")]
    ExpectedNumber {
        /// The source line where the error occurred.
        line: usize,
    },
    /// An integer value was expected, but not found.
    #[error("Error on line {line}: Expected integer.")]
    ExpectedInteger {
        /// The source line where the error occurred.
        line: usize,
    },
    /// An array value was expected, but not found.
    #[error("Error on line {line}: Expected array.")]
    ExpectedArray {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A function was called with the wrong number of arguments.
    #[error("Error on line {line}: Function '{name}' takes {expected} argument(s) but {found} were given.")]
    ArgumentCountMismatch {
        /// The called function.
        name:     String,
        /// The number of formal parameters.
        expected: usize,
        /// The number of supplied arguments.
        found:    usize,
        /// The source line where the error occurred.
        line:     usize,
    },
    /// Integer arithmetic overflowed, or a real result was not finite.
    #[error("Error on line {line}: Overflow while trying to compute result.")]
    Overflow {
        /// The source line where the error occurred.
        line: usize,
    },
    /// Tried to access an array element outside its 1-based bounds.
    #[error("Error on line {line}: Index out of bounds. Valid indices are 1 to {max}, but found {found} instead.")]
    IndexOutOfBounds {
        /// The largest valid index.
        max:   usize,
        /// The index that was actually requested.
        found: i64,
        /// The source line where the error occurred.
        line:  usize,
    },
    /// Attempted division by zero.
    #[error("Error on line {line}: Division by zero.")]
    DivisionByZero {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A for loop was given a step of zero.
    #[error("Error on line {line}: The step of a for loop must not be zero.")]
    ZeroStep {
        /// The source line where the error occurred.
        line: usize,
    },
    /// The machine itself is inconsistent.
    #[error(transparent)]
    Lts(#[from] LtsError),
    /// A call made in single-step mode is waiting for its callee to finish.
    ///
    /// This never escapes the stepping engine.
    #[error("Error on line {line}: Call of '{name}' is pending.")]
    CallPending {
        /// The called function.
        name: String,
        /// The source line of the call.
        line: usize,
    },
}
