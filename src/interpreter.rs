/// The evaluator module executes parsed formulas and statements.
///
/// It computes operator results, reads and writes the variable store of the
/// executing machine and routes function calls to a caller-supplied handler.
///
/// # Responsibilities
/// - Evaluates formulas with the language's numeric promotion rules.
/// - Applies declarations, assignments and appends.
/// - Reports runtime errors such as division by zero or bad indices.
pub mod evaluator;
/// The lexer module tokenizes one statement line.
///
/// Produces tokens for literals, names, type keywords, block keywords and
/// every ASCII, full-width and Japanese spelling of the operators.
pub mod lexer;
/// The parser module builds formulas and classifies statements.
///
/// # Responsibilities
/// - Parses formulas with the operator precedence table.
/// - Recognises block keywords, declarations, assignments and appends.
/// - Validates grammar, reporting errors with the source line.
pub mod parser;
/// The value module defines the runtime data types.
pub mod value;
