use logos::Logos;

use crate::{ast::DeclaredType, error::ParseError, interpreter::parser::core::ParseResult};

/// Represents a lexical token of one statement line.
///
/// Most operators have an ASCII spelling and a full-width or Japanese
/// spelling; both lex to the same token.
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(extras = LexerExtras)]
pub enum Token {
    /// Real literal tokens, such as `3.14`.
    #[regex(r"[0-9]+\.[0-9]+", parse_float)]
    Real(f64),
    /// Integer literal tokens, such as `42`.
    #[regex(r"[0-9]+", parse_integer)]
    Integer(i64),
    /// Boolean literal tokens, such as `true`.
    #[token("true", parse_bool)]
    #[token("false", parse_bool)]
    Bool(bool),
    /// `未定義`
    #[token("未定義")]
    Undefined,
    /// Type keywords such as `整数型` or `実数型の二次元配列`.
    #[regex(r"(整数型|実数型|文字列型|論理型)(の配列|の二次元配列)?", |lex| lex.slice().parse::<DeclaredType>().ok())]
    Type(DeclaredType),
    /// Identifier tokens; variable or function names such as `x` or `total_1`.
    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    /// `if`
    #[token("if")]
    If,
    /// `elseif`
    #[token("elseif")]
    ElseIf,
    /// `else`
    #[token("else")]
    Else,
    /// `endif`
    #[token("endif")]
    EndIf,
    /// `while`
    #[token("while")]
    While,
    /// `endwhile`
    #[token("endwhile")]
    EndWhile,
    /// `do`
    #[token("do")]
    Do,
    /// `for`
    #[token("for")]
    For,
    /// `endfor`
    #[token("endfor")]
    EndFor,
    /// `return`
    #[token("return")]
    Return,
    /// `○`, the function header marker.
    #[token("○")]
    FunctionMarker,

    /// `not`
    #[token("not")]
    Not,
    /// `mod`
    #[token("mod")]
    Mod,
    /// `かつ`
    #[token("かつ")]
    #[token("and")]
    And,
    /// `または`
    #[token("または")]
    #[token("or")]
    Or,
    /// `+`
    #[token("+")]
    #[token("＋")]
    Plus,
    /// `-`
    #[token("-")]
    #[token("－")]
    Minus,
    /// `*`
    #[token("*")]
    #[token("×")]
    Star,
    /// `/`
    #[token("/")]
    #[token("÷")]
    Slash,
    /// `&`
    #[token("&")]
    Ampersand,
    /// `|`
    #[token("|")]
    Pipe,
    /// `=`
    #[token("=")]
    #[token("＝")]
    #[token("==")]
    Equal,
    /// `≠`
    #[token("≠")]
    #[token("!=")]
    NotEqual,
    /// `<`
    #[token("<")]
    #[token("＜")]
    Less,
    /// `>`
    #[token(">")]
    #[token("＞")]
    Greater,
    /// `≦`
    #[token("≦")]
    #[token("<=")]
    LessEqual,
    /// `≧`
    #[token("≧")]
    #[token(">=")]
    GreaterEqual,
    /// `←`
    #[token("←")]
    #[token("<-")]
    #[token("＜－")]
    Assign,

    /// `(`
    #[token("(")]
    #[token("（")]
    LParen,
    /// `)`
    #[token(")")]
    #[token("）")]
    RParen,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `,`
    #[token(",")]
    #[token("，")]
    Comma,
    /// `:`
    #[token(":")]
    #[token("：")]
    Colon,

    /// `の商`
    #[token("の商")]
    Quotient,
    /// `の余り`
    #[token("の余り")]
    Remainder,
    /// `の要素数`
    #[token("の要素数")]
    ElementCount,
    /// `の行数`
    #[token("の行数")]
    RowCount,
    /// `の列数`
    #[token("の列数")]
    ColumnCount,

    /// `が`, opening a natural-language comparison.
    #[token("が")]
    Ga,
    /// `以上`
    #[token("以上")]
    AtLeast,
    /// `以下`
    #[token("以下")]
    AtMost,
    /// `より大きい`
    #[token("より大きい")]
    GreaterThan,
    /// `より小さい`, `未満`
    #[token("より小さい")]
    #[token("未満")]
    LessThan,
    /// `と等しい`, `である`
    #[token("と等しい")]
    #[token("である")]
    EqualTo,
    /// `と等しくない`, `でない`
    #[token("と等しくない")]
    #[token("でない")]
    NotEqualTo,
    /// `で割り切れる`
    #[token("で割り切れる")]
    DivisibleBy,
    /// `で割り切れない`
    #[token("で割り切れない")]
    NotDivisibleBy,

    /// `の末尾に`
    #[token("の末尾に")]
    TailOf,
    /// `を追加する`
    #[token("を追加する")]
    AppendVerb,
    /// `を`
    #[token("を")]
    Wo,
    /// `から`
    #[token("から")]
    From,
    /// `まで`
    #[token("まで")]
    To,
    /// `ずつ増やす`
    #[token("ずつ増やす")]
    Increase,
    /// `ずつ減らす`
    #[token("ずつ減らす")]
    Decrease,

    /// `// Comments.`
    #[regex(r"//[^\n\r]*", logos::skip, allow_greedy = true)]
    Comment,
    /// Spaces, tabs, feeds and the full-width space.
    #[regex(r"[ \t\f\u{3000}]+", logos::skip)]
    Ignored,
}

/// Additional information carried by the lexer during tokenization.
///
/// Statements never span lines, so the line is fixed when the lexer is
/// created and attached to every token it produces.
#[derive(Default)]
pub struct LexerExtras {
    /// The line number of the statement being tokenized.
    pub line: usize,
}

/// Tokenizes one statement.
///
/// # Parameters
/// - `source`: The statement text.
/// - `line`: The 1-based line the statement was read from.
///
/// # Returns
/// Every token paired with `line`.
///
/// # Errors
/// Returns `ParseError::UnexpectedToken` for text outside the language.
///
/// # Example
/// ```
/// use gijigo::interpreter::lexer::{Token, tokenize};
///
/// let tokens = tokenize("x ← 1 ＋ 2", 3).unwrap();
/// assert_eq!(tokens[1], (Token::Assign, 3));
/// assert_eq!(tokens[3], (Token::Plus, 3));
/// ```
pub fn tokenize(source: &str, line: usize) -> ParseResult<Vec<(Token, usize)>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer_with_extras(source, LexerExtras { line });

    while let Some(token) = lexer.next() {
        if let Ok(tok) = token {
            tokens.push((tok, lexer.extras.line));
        } else {
            return Err(ParseError::UnexpectedToken { token: lexer.slice().to_string(),
                                                     line:  lexer.extras.line, });
        }
    }

    Ok(tokens)
}

/// Parses a floating-point literal from the current token slice.
///
/// Literals too large for a finite `f64` are rejected by the lexer.
fn parse_float(lex: &logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok().filter(|r: &f64| r.is_finite())
}
/// Parses an integer literal from the current token slice.
///
/// Literals that do not fit an `i64` are rejected by the lexer.
fn parse_integer(lex: &logos::Lexer<Token>) -> Option<i64> {
    lex.slice().parse().ok()
}
/// Parses a boolean literal from the current token slice (`true` or `false`).
fn parse_bool(lex: &logos::Lexer<Token>) -> Option<bool> {
    match lex.slice() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BaseType;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source, 1).unwrap().into_iter().map(|(token, _)| token).collect()
    }

    #[test]
    fn full_width_and_ascii_spellings_agree() {
        assert_eq!(kinds("a ＋ b"), kinds("a + b"));
        assert_eq!(kinds("a ≧ b"), kinds("a >= b"));
        assert_eq!(kinds("x ＜－ 1"), kinds("x <- 1"));
        assert_eq!(kinds("（1）"), kinds("(1)"));
    }

    #[test]
    fn japanese_suffixes_split_from_names() {
        assert_eq!(kinds("aの要素数"),
                   vec![Token::Identifier("a".into()), Token::ElementCount]);
        assert_eq!(kinds("x が 1以上"),
                   vec![Token::Identifier("x".into()),
                        Token::Ga,
                        Token::Integer(1),
                        Token::AtLeast]);
    }

    #[test]
    fn longest_phrase_wins() {
        assert_eq!(kinds("と等しくない"), vec![Token::NotEqualTo]);
        assert_eq!(kinds("で割り切れない"), vec![Token::NotDivisibleBy]);
        assert_eq!(kinds("を追加する"), vec![Token::AppendVerb]);
    }

    #[test]
    fn type_keywords_carry_dimension() {
        assert_eq!(kinds("実数型の二次元配列"),
                   vec![Token::Type(DeclaredType { base:      BaseType::Real,
                                                   dimension: 2, })]);
    }

    #[test]
    fn comments_and_full_width_space_are_skipped() {
        assert_eq!(kinds("1　+ 2 // trailing"),
                   vec![Token::Integer(1), Token::Plus, Token::Integer(2)]);
    }

    #[test]
    fn oversized_reals_are_rejected() {
        let huge = format!("{}.0", "9".repeat(400));
        assert!(matches!(tokenize(&huge, 2), Err(ParseError::UnexpectedToken { line: 2, .. })));
    }

    #[test]
    fn unknown_text_is_rejected() {
        assert_eq!(tokenize("x ← @", 7),
                   Err(ParseError::UnexpectedToken { token: "@".into(),
                                                     line:  7, }));
    }
}
