/// Binary operator evaluation logic.
///
/// Handles arithmetic, bitwise and logical operators as well as comparison
/// chains.
pub mod binary;

/// Unary operator evaluation logic.
///
/// Implements arithmetic negation, unary plus and logical negation.
pub mod unary;

/// Core evaluation logic and context management.
///
/// Contains the evaluation context, the dispatch over formula nodes and error
/// propagation.
pub mod core;

/// Array access.
///
/// Reads elements and sizes of arrays and locates elements for in-place
/// stores.
pub mod access;

/// Statement effects.
///
/// Applies declarations, assignments and appends to the variable store.
pub mod statement;

/// Function calls.
///
/// Defines the seam through which formulas call user-defined functions.
pub mod function;
