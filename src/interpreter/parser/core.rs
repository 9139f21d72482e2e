use std::iter::Peekable;

use crate::{
    ast::Expr,
    error::ParseError,
    interpreter::{
        lexer::{Token, tokenize},
        parser::{binary::parse_operators, unary::parse_unary},
    },
};

pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a full expression.
///
/// This is the entry point for expression parsing. An operand is read first
/// and then combined with the operators that follow, starting with no
/// operator pending so every class may be consumed.
///
/// Grammar: `expression := unary (operator unary)*`
///
/// # Parameters
/// - `tokens`: Token iterator providing `(Token, line)` pairs.
///
/// # Returns
/// The parsed expression node. Parsing stops at the first token that cannot
/// continue the expression, which is left in the stream.
pub fn parse_expression<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let left = parse_unary(tokens)?;
    parse_operators(tokens, left, None)
}

/// Parses a complete formula from source text.
///
/// # Parameters
/// - `source`: The formula text.
/// - `line`: The 1-based source line, attached to every node and error.
///
/// # Errors
/// Returns a `ParseError` if the text is not a formula or if anything is left
/// over after it.
///
/// # Example
/// ```
/// use gijigo::interpreter::parser::core::parse_formula;
///
/// let expr = parse_formula("1 + 2 * 3", 1).unwrap();
/// assert_eq!(expr.to_string(), "(+ 1 (* 2 3))");
/// ```
pub fn parse_formula(source: &str, line: usize) -> ParseResult<Expr> {
    let tokens = tokenize(source, line)?;
    let mut iter = tokens.iter().peekable();
    let expr = parse_expression(&mut iter).map_err(|e| e.or_line(line))?;
    expect_end(&mut iter)?;
    Ok(expr)
}

/// Validates a formula without evaluating it.
///
/// The whole grammar is checked, including calls and their arguments, but no
/// name is resolved, so unbound variables do not fail a dry run.
///
/// # Example
/// ```
/// use gijigo::interpreter::parser::core::dry_run;
///
/// assert!(dry_run("total + f(x, 2)", 1));
/// assert!(!dry_run("total +", 1));
/// ```
#[must_use]
pub fn dry_run(source: &str, line: usize) -> bool {
    parse_formula(source, line).is_ok()
}

/// Fails unless the token stream is exhausted.
pub(crate) fn expect_end<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<()>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    match tokens.next() {
        None => Ok(()),
        Some((tok, line)) => {
            Err(ParseError::InvalidFormula { details: format!("unexpected {tok:?} after the formula"),
                                             line:    *line, })
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(source: &str) -> String {
        parse_formula(source, 1).unwrap().to_string()
    }

    #[test]
    fn precedence_follows_operator_classes() {
        assert_eq!(tree("1+2+3*4*5-6-7"),
                   "(- (- (+ (+ 1 2) (* (* 3 4) 5)) 6) 7)");
        assert_eq!(tree("1 - 2 * 3 - 4"), "(- (- 1 (* 2 3)) 4)");
        assert_eq!(tree("a | b & c = d + 1"), "(| a (& b (chain c = (+ d 1))))");
        assert_eq!(tree("x > 0 かつ y > 0 または z"),
                   "(or (and (chain x > 0) (chain y > 0)) z)");
    }

    #[test]
    fn prefix_operators_bind_tightest() {
        assert_eq!(tree("-2 * 3"), "(* (neg 2) 3)");
        assert_eq!(tree("not a かつ b"), "(and (not a) b)");
    }

    #[test]
    fn relations_chain_pairwise() {
        assert_eq!(tree("2<3<4"), "(chain 2 < 3 < 4)");
        assert_eq!(tree("(2<3)<4"), "(chain (chain 2 < 3) < 4)");
    }

    #[test]
    fn natural_language_comparisons() {
        assert_eq!(tree("x が y + 1 以上"), "(chain x >= (+ y 1))");
        assert_eq!(tree("n が 3 で割り切れる"), "(chain n divisible 3)");
        assert_eq!(tree("x が 未定義"), "(chain x = 未定義)");
        assert_eq!(tree("x が 未定義 でない"), "(chain x != 未定義)");
        assert!(parse_formula("x が 3", 1).is_err());
    }

    #[test]
    fn division_suffixes() {
        assert_eq!(tree("7 ÷ 2 の商 + 1"), "(+ (div 7 2) 1)");
        assert_eq!(tree("1 + 7 ÷ 2 の余り"), "(+ 1 (mod 7 2))");
    }

    #[test]
    fn postfix_index_and_size() {
        assert_eq!(tree("a[2][1]"), "([] ([] a 2) 1)");
        assert_eq!(tree("aの行数 * a[1]の要素数"), "(* (rows a) (len ([] a 1)))");
        assert_eq!(tree("{{1, 2}, {}}"), "{{1 2} {}}");
        assert_eq!(tree("f(1, g(x))"), "(f 1 (g x))");
    }

    #[test]
    fn unclosed_brackets_are_reported() {
        assert_eq!(parse_formula("(1 + 2", 4), Err(ParseError::UnmatchedParenthesis { line: 4 }));
        assert_eq!(parse_formula("a[1", 5), Err(ParseError::UnmatchedBracket { line: 5 }));
        assert_eq!(parse_formula("{1, 2", 6), Err(ParseError::UnmatchedBrace { line: 6 }));
        assert_eq!(parse_formula("f(1", 7), Err(ParseError::UnmatchedParenthesis { line: 7 }));
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        assert!(matches!(parse_formula("1 2", 1), Err(ParseError::InvalidFormula { .. })));
        assert_eq!(parse_formula("1 +", 3), Err(ParseError::UnexpectedEndOfInput { line: 3 }));
    }
}
