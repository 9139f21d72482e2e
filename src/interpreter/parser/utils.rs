use std::iter::Peekable;

use crate::{
    ast::DeclaredType,
    error::ParseError,
    interpreter::{lexer::Token, parser::core::ParseResult},
};

/// Parses `item, item, ...` up to and including `closing`.
///
/// Array literals, argument lists and parameter lists all go through here.
/// A list may be empty, but a trailing comma is rejected.
///
/// # Errors
/// The error of a failing item, `InvalidFormula` for a token that is neither
/// a comma nor `closing`, and `UnexpectedEndOfInput` when the line ends
/// first.
pub(in crate::interpreter::parser) fn parse_comma_separated<'a, I, T>(
    tokens: &mut Peekable<I>,
    parse_item: impl Fn(&mut Peekable<I>) -> ParseResult<T>,
    closing: &Token)
    -> Result<Vec<T>, ParseError>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    if consume(tokens, closing).is_some() {
        return Ok(Vec::new());
    }

    let mut items = vec![parse_item(tokens)?];
    while consume(tokens, closing).is_none() {
        match tokens.next() {
            Some((Token::Comma, _)) => items.push(parse_item(tokens)?),
            Some((tok, line)) => {
                let details = format!("expected ',' or {closing:?}, found {tok:?}");
                return Err(ParseError::InvalidFormula { details,
                                                        line: *line });
            },
            None => return Err(ParseError::UnexpectedEndOfInput { line: 0 }),
        }
    }
    Ok(items)
}

/// Parses a plain identifier and returns its name.
///
/// # Errors
/// Returns `ParseError::InvalidName` if the next token is not an identifier,
/// or `UnexpectedEndOfInput` if the input ends.
pub(in crate::interpreter::parser) fn parse_identifier<'a, I>(tokens: &mut Peekable<I>)
                                                              -> ParseResult<String>
    where I: Iterator<Item = &'a (Token, usize)>
{
    match tokens.next() {
        Some((Token::Identifier(s), _)) => Ok(s.clone()),
        Some((tok, line)) => Err(ParseError::InvalidName { found: format!("{tok:?}"),
                                                           line:  *line, }),
        None => Err(ParseError::UnexpectedEndOfInput { line: 0 }),
    }
}

/// Parses a typed name `<type>: name`, as used by parameter lists.
///
/// # Errors
/// Returns `InvalidFunctionDeclaration` if the type or colon is missing, and
/// `InvalidName` if the name is malformed.
pub(in crate::interpreter::parser) fn parse_parameter<'a, I>(
    tokens: &mut Peekable<I>)
    -> ParseResult<(String, DeclaredType)>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let (declared, line) = match tokens.next() {
        Some((Token::Type(declared), line)) => (*declared, *line),
        Some((tok, line)) => {
            return Err(ParseError::InvalidFunctionDeclaration { details: format!("expected a parameter type, found {tok:?}"),
                                                                line:    *line, });
        },
        None => return Err(ParseError::UnexpectedEndOfInput { line: 0 }),
    };
    let details = "expected ':' after the parameter type".to_string();
    let missing_colon = || ParseError::InvalidFunctionDeclaration { details, line };
    consume(tokens, &Token::Colon).ok_or_else(missing_colon)?;
    let name = parse_identifier(tokens)?;
    Ok((name, declared))
}

/// Consumes the next token if it equals `expected`.
///
/// # Returns
/// The line of the consumed token, or `None` if the next token differs.
pub(in crate::interpreter::parser) fn consume<'a, I>(tokens: &mut Peekable<I>,
                                                     expected: &Token)
                                                     -> Option<usize>
    where I: Iterator<Item = &'a (Token, usize)>
{
    match tokens.peek() {
        Some((tok, line)) if tok == expected => {
            let line = *line;
            tokens.next();
            Some(line)
        },
        _ => None,
    }
}

/// Skips an identifier followed by any number of bracketed groups.
///
/// Used as lookahead on a cloned iterator to recognise assignment targets
/// without parsing the index expressions.
pub(in crate::interpreter::parser) fn skip_target<'a, I>(tokens: &mut Peekable<I>) -> bool
    where I: Iterator<Item = &'a (Token, usize)>
{
    if !matches!(tokens.next(), Some((Token::Identifier(_), _))) {
        return false;
    }
    while consume(tokens, &Token::LBracket).is_some() {
        let mut depth = 1usize;
        while depth > 0 {
            match tokens.next() {
                Some((Token::LBracket, _)) => depth += 1,
                Some((Token::RBracket, _)) => depth -= 1,
                Some(_) => {},
                None => return false,
            }
        }
    }
    true
}
