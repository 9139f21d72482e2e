//! # gijigo
//!
//! gijigo compiles the Japanese pseudocode used to teach algorithms into
//! labeled transition systems and executes them, either all at once or one
//! statement at a time. It supports typed declarations, multi-dimensional
//! arrays, natural-language comparisons, `if`/`while`/`do`/`for` blocks and
//! user-defined functions.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
)]
#![allow(clippy::missing_errors_doc)]

use crate::{
    error::Error,
    interpreter::{
        evaluator::{core::Context, function::NoCalls},
        parser::core::parse_formula,
        value::core::Value,
    },
    lts::store::VariableStore,
    program::Program,
};

/// Defines the structure of parsed statements and formulas.
///
/// Formulas are trees of `Expr` nodes; statements are `Action`s. Every
/// transition of a compiled machine carries the `Action` parsed from its
/// label, so execution never parses text.
pub mod ast;
/// Provides unified error types for compilation and execution.
///
/// Every error that concerns the source carries its 1-based line number.
/// The crate-level `Error` joins them with record and I/O failures for the
/// public entry points.
pub mod error;
/// Lexing, parsing and evaluating single statements and formulas.
pub mod interpreter;
/// Labeled transition systems and their variable stores.
///
/// A machine's states are tagged with the kind of statement that leaves
/// them, and its transitions are labeled with the statement's source text.
pub mod lts;
/// Compiling source text into one machine per function plus the main
/// program.
pub mod compiler;
/// Executing compiled machines.
///
/// Provides both direct execution, where calls run to completion inside the
/// calling statement, and single-stepping with an explicit call stack.
pub mod engine;
/// The compiled program as one owned value: its machines, their bindings
/// and the execution position, with JSON records for saving and restoring.
pub mod program;
/// The interactive front end: compile, step, save, restore, inspect.
pub mod manager;
/// General utilities for safe numeric conversion.
pub mod util;

/// Evaluates a formula without variables or functions.
///
/// # Errors
/// Any parse error of the formula, or the runtime error it raises.
///
/// # Examples
/// ```
/// use gijigo::{evaluate_formula, interpreter::value::core::Value};
///
/// assert_eq!(evaluate_formula("1+2+3*4*5-6-7").unwrap(), Value::Integer(50));
/// assert_eq!(evaluate_formula("1 が 1以上").unwrap(), Value::Bool(true));
/// assert!(evaluate_formula("1 ÷ 0").is_err());
/// ```
pub fn evaluate_formula(source: &str) -> Result<Value, Error> {
    let expr = parse_formula(source, 1)?;
    let mut store = VariableStore::new();
    let mut no_calls = NoCalls;
    let mut context = Context::new(&mut store, &mut no_calls);
    Ok(context.eval(&expr)?)
}

/// Compiles and runs a program from the start.
///
/// # Returns
/// The finished program, whose main store holds the final bindings, and the
/// value the main program returned.
///
/// # Errors
/// Any compile error, or the first runtime error.
///
/// # Examples
/// ```
/// use gijigo::{interpreter::value::core::Value, run_source};
///
/// let (program, result) = run_source("整数型: x ← 2\nreturn x * 3\n").unwrap();
/// assert_eq!(result, Some(Value::Integer(6)));
/// assert_eq!(program.main().store().get("x"), Some(&Value::Integer(2)));
/// ```
pub fn run_source(source: &str) -> Result<(Program, Option<Value>), Error> {
    let mut program = Program::compile(source)?;
    let result = program.run()?;
    Ok((program, result))
}
