/// Splitting source text into indented statement lines.
pub mod source;

/// The block compiler and its entry point.
///
/// Walks the statement lines, emitting one labeled transition system for the
/// main program and one per function definition.
pub mod core;

/// Control blocks: `if` chains and the three loop forms.
mod blocks;

/// Function definitions and return unification.
mod function;

/// Re-attaching parsed statements to transition labels.
///
/// Program records store labels only; linking parses every label again
/// according to the type of its source state.
pub mod link;
