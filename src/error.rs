/// Parsing errors.
///
/// Defines all error types that can occur during lexing, parsing and
/// compilation of source code: malformed formulas and statements, unclosed
/// blocks and inconsistent indentation.
pub mod parse_error;
/// Runtime errors.
///
/// Contains all error types that can be raised while a compiled program is
/// executed, such as unbound names, type mismatches, out-of-range indices or
/// division by zero.
pub mod runtime_error;
/// Machine integrity errors.
///
/// Raised when a state or transition of a labeled transition system is
/// referenced that does not exist.
pub mod lts_error;

pub use lts_error::LtsError;
pub use parse_error::ParseError;
pub use runtime_error::RuntimeError;

/// Any error produced by the public entry points of the crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The source could not be compiled.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The program failed while running.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    /// A machine was structurally inconsistent.
    #[error(transparent)]
    Lts(#[from] LtsError),
    /// A program record could not be encoded or decoded.
    #[error("Invalid program record: {0}")]
    Record(#[from] serde_json::Error),
    /// Reading or writing a file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// An operation needs a compiled program but none is loaded.
    #[error("No program is loaded. Compile a source file or restore a record first.")]
    NoProgram,
}
