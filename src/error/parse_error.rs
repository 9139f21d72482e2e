/// Represents all errors that can occur while lexing, parsing or compiling a
/// program.
///
/// Grammar errors concern a single statement or formula. Structural errors
/// concern the block layout of the source (closing keywords and indentation).
/// Every variant carries the 1-based source line it was raised for.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The lexer found text that is not part of the language.
    #[error("Error on line {line}: Unexpected text '{token}'.")]
    UnexpectedToken {
        /// The offending source text.
        token: String,
        /// The source line where the error occurred.
        line:  usize,
    },
    /// The formula ended while more input was required.
    #[error("Error on line {line}: Unexpected end of input.")]
    UnexpectedEndOfInput {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A name was required but something else was found.
    #[error("Error on line {line}: '{found}' cannot be used as a name. Names start with a letter and contain only letters, digits and '_'.")]
    InvalidName {
        /// What was found instead.
        found: String,
        /// The source line where the error occurred.
        line:  usize,
    },
    /// The formula is malformed.
    #[error("Error on line {line}: Invalid formula: {details}.")]
    InvalidFormula {
        /// Details describing what went wrong.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// An opening `(` has no matching `)`.
    #[error("Error on line {line}: '(' has no matching ')'.")]
    UnmatchedParenthesis {
        /// The source line where the error occurred.
        line: usize,
    },
    /// An opening `[` has no matching `]`.
    #[error("Error on line {line}: '[' has no matching ']'.")]
    UnmatchedBracket {
        /// The source line where the error occurred.
        line: usize,
    },
    /// An opening `{` has no matching `}`.
    #[error("Error on line {line}: '{{' has no matching '}}'.")]
    UnmatchedBrace {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A declaration does not follow `<type>: name [← value], ...`.
    #[error("Error on line {line}: Invalid declaration.")]
    InvalidDeclaration {
        /// The source line where the error occurred.
        line: usize,
    },
    /// An assignment does not follow `name[index]... ← value`.
    #[error("Error on line {line}: Invalid assignment.")]
    InvalidAssignment {
        /// The source line where the error occurred.
        line: usize,
    },
    /// An append does not follow `name の末尾に value を追加する`.
    #[error("Error on line {line}: Invalid append statement.")]
    InvalidAppend {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A call names a function that is not defined, or is malformed.
    #[error("Error on line {line}: Invalid call of function '{name}'.")]
    InvalidFunctionCall {
        /// The called name.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A function header is malformed, misplaced or duplicated.
    #[error("Error on line {line}: Invalid function declaration: {details}.")]
    InvalidFunctionDeclaration {
        /// Details describing what went wrong.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A `for` header does not follow `v を from から to まで step ずつ増やす`.
    #[error("Error on line {line}: Invalid for header.")]
    InvalidForHeader {
        /// The source line where the error occurred.
        line: usize,
    },
    /// The line matches no statement form.
    #[error("Error on line {line}: Cannot interpret statement '{text}'.")]
    UnrecognizedStatement {
        /// The trimmed statement text.
        text: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// An `if` block is not closed by `endif`.
    #[error("Error on line {line}: The if block is not terminated by 'endif'.")]
    IfBlock {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A `while` block is not closed by `endwhile`.
    #[error("Error on line {line}: The while block is not terminated by 'endwhile'.")]
    WhileBlock {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A `do` block is not closed by a trailing `while (...)`.
    #[error("Error on line {line}: The do block is not terminated by 'while (condition)'.")]
    DoWhileBlock {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A `for` block is not closed by `endfor`.
    #[error("Error on line {line}: The for block is not terminated by 'endfor'.")]
    ForBlock {
        /// The source line where the error occurred.
        line: usize,
    },
    /// The indentation of a line does not fit its block.
    #[error("Error on line {line}: Inconsistent indentation.")]
    Indentation {
        /// The source line where the error occurred.
        line: usize,
    },
}

impl ParseError {
    /// Returns the 1-based source line the error was raised for.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::UnexpectedToken { line, .. }
            | Self::UnexpectedEndOfInput { line }
            | Self::InvalidName { line, .. }
            | Self::InvalidFormula { line, .. }
            | Self::UnmatchedParenthesis { line }
            | Self::UnmatchedBracket { line }
            | Self::UnmatchedBrace { line }
            | Self::InvalidDeclaration { line }
            | Self::InvalidAssignment { line }
            | Self::InvalidAppend { line }
            | Self::InvalidFunctionCall { line, .. }
            | Self::InvalidFunctionDeclaration { line, .. }
            | Self::InvalidForHeader { line }
            | Self::UnrecognizedStatement { line, .. }
            | Self::IfBlock { line }
            | Self::WhileBlock { line }
            | Self::DoWhileBlock { line }
            | Self::ForBlock { line }
            | Self::Indentation { line } => *line,
        }
    }

    /// Fills in `line` when the error was raised at the end of a statement,
    /// where no token is left to carry a line number.
    #[must_use]
    pub(crate) fn or_line(self, line: usize) -> Self {
        match self {
            Self::UnexpectedEndOfInput { line: 0 } => Self::UnexpectedEndOfInput { line },
            other => other,
        }
    }
}
