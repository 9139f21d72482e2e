use std::iter::Peekable;

use crate::{
    ast::{Expr, LiteralValue, SizeMeasure, UnaryOperator},
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{
            core::{ParseResult, parse_expression},
            utils::parse_comma_separated,
        },
    },
};

/// Parses an operand with its prefix operators.
///
/// `not`, `-` and `+` apply to the operand that immediately follows them and
/// therefore bind tighter than any binary operator. If no prefix operator is
/// present, parsing falls through to [`parse_primary`] followed by
/// [`parse_postfix`].
///
/// Grammar:
/// ```text
///     unary := ("not" | "-" | "+") unary
///            | primary postfix*
/// ```
/// # Parameters
/// - `tokens`: Token iterator with lookahead.
///
/// # Returns
/// An [`Expr::UnaryOp`] or a primary expression possibly followed by postfixes.
pub(crate) fn parse_unary<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let op = match tokens.peek() {
        Some((Token::Not, _)) => UnaryOperator::Not,
        Some((Token::Minus, _)) => UnaryOperator::Negate,
        Some((Token::Plus, _)) => UnaryOperator::Plus,
        _ => {
            let primary = parse_primary(tokens)?;
            return parse_postfix(tokens, primary);
        },
    };
    let (_, line) = tokens.next().ok_or(ParseError::UnexpectedEndOfInput { line: 0 })?;
    let expr = parse_unary(tokens)?;
    Ok(Expr::UnaryOp { op,
                       expr: Box::new(expr),
                       line: *line })
}

/// Parses a primary (atomic) expression.
///
/// Grammar (simplified):
/// ```text
///     primary := INTEGER | REAL | BOOL | "未定義"
///              | NAME
///              | NAME "(" arguments ")"
///              | "(" expression ")"
///              | "{" elements "}"
/// ```
/// A name directly followed by `(` is a function call; whether the function
/// exists is checked when the program is compiled.
///
/// # Parameters
/// - `tokens`: Token iterator positioned at the start of a primary expression.
///
/// # Returns
/// The parsed primary [`Expr`] or a `ParseError` on failure.
pub(crate) fn parse_primary<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let (token, line) = tokens.next()
                              .ok_or(ParseError::UnexpectedEndOfInput { line: 0 })?;
    let line = *line;

    let literal = |value: LiteralValue| -> ParseResult<Expr> { Ok(Expr::Literal { value, line }) };
    match token {
        Token::Integer(i) => literal((*i).into()),
        Token::Real(r) => literal((*r).into()),
        Token::Bool(b) => literal((*b).into()),
        Token::Undefined => literal(LiteralValue::Undefined),
        Token::Identifier(name) => parse_identifier_or_function(tokens, name.clone(), line),
        Token::LParen => {
            let expr = parse_expression(tokens).map_err(|e| unclosed(e, line, &Token::RParen))?;
            match tokens.next() {
                Some((Token::RParen, _)) => Ok(expr),
                Some((tok, line)) => {
                    Err(ParseError::InvalidFormula { details: format!("expected ')', found {tok:?}"),
                                                     line:    *line, })
                },
                None => Err(ParseError::UnmatchedParenthesis { line }),
            }
        },
        Token::LBrace => {
            let elements = parse_comma_separated(tokens, parse_expression, &Token::RBrace)
                               .map_err(|e| unclosed(e, line, &Token::RBrace))?;
            Ok(Expr::ArrayLiteral { elements, line })
        },
        tok => Err(ParseError::InvalidFormula { details: format!("unexpected {tok:?}"),
                                                line }),
    }
}

/// Parses a variable reference or a function call.
fn parse_identifier_or_function<'a, I>(tokens: &mut Peekable<I>,
                                       name: String,
                                       line: usize)
                                       -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    if let Some((Token::LParen, paren_line)) = tokens.peek() {
        tokens.next();
        let arguments = parse_comma_separated(tokens, parse_expression, &Token::RParen)
                            .map_err(|e| unclosed(e, *paren_line, &Token::RParen))?;
        return Ok(Expr::FunctionCall { name, arguments, line });
    }
    Ok(Expr::Variable { name, line })
}

/// Parses postfix operators applied to an expression.
///
/// 1. **Array indexing** `expr[index]`, 1-based. Multiple chained indices
///    address nested arrays: `a[2][1]`.
/// 2. **Size suffixes** `の要素数`, `の行数` and `の列数`.
///
/// Parsing continues until no further postfix operator is found.
///
/// Grammar:
/// ```text
///     postfix := primary
///              | postfix "[" expression "]"
///              | postfix ("の要素数" | "の行数" | "の列数")
/// ```
/// # Errors
/// Returns a `ParseError` if an `[` is not closed with `]` or the index
/// expression fails to parse.
fn parse_postfix<'a, I>(tokens: &mut Peekable<I>, mut node: Expr) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    loop {
        let measure = match tokens.peek() {
            Some((Token::LBracket, index_line)) => {
                tokens.next();
                let index = parse_expression(tokens).map_err(|e| {
                                                        unclosed(e, *index_line, &Token::RBracket)
                                                    })?;
                match tokens.next() {
                    Some((Token::RBracket, _)) => {
                        node = Expr::ArrayIndex { array: Box::new(node),
                                                  index: Box::new(index),
                                                  line:  *index_line, };
                    },
                    Some((tok, line)) => {
                        return Err(ParseError::InvalidFormula { details: format!("expected ']', found {tok:?}"),
                                                                line:    *line, });
                    },
                    None => return Err(ParseError::UnmatchedBracket { line: *index_line }),
                }
                continue;
            },
            Some((Token::ElementCount, _)) => SizeMeasure::Elements,
            Some((Token::RowCount, _)) => SizeMeasure::Rows,
            Some((Token::ColumnCount, _)) => SizeMeasure::Columns,
            _ => break,
        };
        tokens.next();
        let line = node.line_number();
        node = Expr::Size { array: Box::new(node),
                            measure,
                            line };
    }
    Ok(node)
}

/// Reports a missing closing token at the line of its opening token.
fn unclosed(error: ParseError, line: usize, closing: &Token) -> ParseError {
    match (error, closing) {
        (ParseError::UnexpectedEndOfInput { .. }, Token::RParen) => {
            ParseError::UnmatchedParenthesis { line }
        },
        (ParseError::UnexpectedEndOfInput { .. }, Token::RBracket) => {
            ParseError::UnmatchedBracket { line }
        },
        (ParseError::UnexpectedEndOfInput { .. }, Token::RBrace) => {
            ParseError::UnmatchedBrace { line }
        },
        (error, _) => error,
    }
}
