/// Entry points for parsing formulas.
///
/// Contains the top-level formula parser, dry-run validation and the result
/// type shared by all parsing routines.
pub mod core;

/// Operand parsing.
///
/// Handles literals, names, function calls, grouping, array literals, prefix
/// operators and the postfix index and size suffixes.
pub mod unary;

/// Binary operator parsing.
///
/// Combines operands with the explicit superiority relation between operator
/// classes, including the natural-language `が` comparisons.
pub mod binary;

/// Utility functions for the parser.
///
/// Provides helpers for comma-separated lists, identifiers and expected
/// tokens.
pub mod utils;

/// Statement parsing.
///
/// Classifies one source line and parses declarations, assignments, appends,
/// loop headers, returns and function headers.
pub mod statement;
