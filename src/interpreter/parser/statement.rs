use std::iter::Peekable;

use crate::{
    ast::{Action, Assignment, Declaration, Direction, Expr, ForHeader, FunctionSignature,
          LiteralValue},
    error::ParseError,
    interpreter::{
        lexer::{Token, tokenize},
        parser::{
            core::{ParseResult, expect_end, parse_expression, parse_formula},
            utils::{consume, parse_comma_separated, parse_identifier, parse_parameter,
                    skip_target},
        },
    },
};

/// A guarded block header: the label stored on the machine and its parsed
/// form.
#[derive(Debug, Clone, PartialEq)]
pub struct Guard {
    /// The condition or loop header text, without the surrounding parentheses.
    pub label:  String,
    /// The parsed condition or loop header.
    pub action: Action,
}

/// One classified source line.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `○[type:] name(type: param, ...)`
    Function(FunctionSignature),
    /// `if (condition)`
    If(Guard),
    /// `elseif (condition)`
    ElseIf(Guard),
    /// `else`
    Else,
    /// `endif`
    EndIf,
    /// `while (condition)`, opening a loop or closing a `do` block.
    While(Guard),
    /// `endwhile`
    EndWhile,
    /// `do`
    Do,
    /// `for (v を from から to まで step ずつ増やす)`
    For(Guard),
    /// `endfor`
    EndFor,
    /// A declaration, assignment, append, return or bare formula.
    Simple(Action),
}

/// Parses a single source line.
///
/// The line is recognised, in order, as one of:
/// - a function header,
/// - a block keyword (`if`, `elseif`, `else`, `endif`, `while`, `endwhile`,
///   `do`, `for`, `endfor`),
/// - a `return`,
/// - a declaration,
/// - an assignment or an append, recognised by lookahead over the target,
/// - a bare formula.
///
/// # Parameters
/// - `text`: The trimmed line without its comment.
/// - `line`: The 1-based source line.
///
/// # Returns
/// The classified [`Statement`].
///
/// # Errors
/// Returns the specific grammar error of the recognised form, or
/// `UnrecognizedStatement` if the line matches no form at all.
///
/// # Example
/// ```
/// use gijigo::{
///     ast::Action,
///     interpreter::parser::statement::{Statement, parse_statement},
/// };
///
/// let Statement::If(guard) = parse_statement("if (x が 0 より大きい)", 2).unwrap() else {
///     panic!("expected an if header");
/// };
/// assert_eq!(guard.label, "x が 0 より大きい");
/// assert!(matches!(guard.action, Action::Condition(_)));
/// ```
pub fn parse_statement(text: &str, line: usize) -> ParseResult<Statement> {
    let tokens = tokenize(text, line)?;
    let mut iter = tokens.iter().peekable();
    let unrecognized = || ParseError::UnrecognizedStatement { text: text.to_string(),
                                                              line };

    let statement = match iter.peek() {
        None => return Err(unrecognized()),
        Some((Token::FunctionMarker, _)) => {
            Statement::Function(parse_signature(&mut iter).map_err(|e| e.or_line(line))?)
        },
        Some((Token::If, _)) => Statement::If(parse_guard(text, "if", line, parse_condition)?),
        Some((Token::ElseIf, _)) => {
            Statement::ElseIf(parse_guard(text, "elseif", line, parse_condition)?)
        },
        Some((Token::While, _)) => {
            Statement::While(parse_guard(text, "while", line, parse_condition)?)
        },
        Some((Token::For, _)) => Statement::For(parse_guard(text, "for", line, parse_for)?),
        Some((Token::Else | Token::EndIf | Token::EndWhile | Token::Do | Token::EndFor, _))
            if tokens.len() == 1 =>
        {
            match tokens[0].0 {
                Token::Else => Statement::Else,
                Token::EndIf => Statement::EndIf,
                Token::EndWhile => Statement::EndWhile,
                Token::Do => Statement::Do,
                _ => Statement::EndFor,
            }
        },
        Some((Token::Else | Token::EndIf | Token::EndWhile | Token::Do | Token::EndFor, _)) => {
            return Err(unrecognized());
        },
        Some((Token::Return, _)) => {
            Statement::Simple(parse_return(&mut iter).map_err(|e| e.or_line(line))?)
        },
        Some((Token::Type(_), _)) => {
            Statement::Simple(parse_declaration(&mut iter).map_err(|e| e.or_line(line))?)
        },
        Some((Token::Identifier(_), _)) => {
            let mut lookahead = iter.clone();
            let is_target = skip_target(&mut lookahead);
            match lookahead.peek() {
                Some((Token::Assign, _)) if is_target => {
                    Statement::Simple(parse_assignment(&mut iter).map_err(|e| e.or_line(line))?)
                },
                Some((Token::TailOf, _)) if is_target => {
                    Statement::Simple(parse_append(&mut iter).map_err(|e| e.or_line(line))?)
                },
                _ => Statement::Simple(parse_bare_formula(text, line)?),
            }
        },
        Some(_) => Statement::Simple(parse_bare_formula(text, line)?),
    };
    Ok(statement)
}

/// Parses a branch or loop condition label.
///
/// # Errors
/// Propagates formula errors.
pub fn parse_condition(label: &str, line: usize) -> ParseResult<Action> {
    parse_formula(label, line).map(Action::Condition)
}

/// Parses a `for` header label such as `i を 1 から n まで 2 ずつ増やす`.
///
/// The step part is optional and defaults to `1 ずつ増やす`.
///
/// # Errors
/// Returns `InvalidForHeader` if the label does not follow the header form.
pub fn parse_for(label: &str, line: usize) -> ParseResult<Action> {
    let tokens = tokenize(label, line)?;
    let mut iter = tokens.iter().peekable();
    parse_for_header(&mut iter, line).map(Action::For)
                                     .map_err(|_| ParseError::InvalidForHeader { line })
}

/// Splits a block header into keyword and label and parses the label.
///
/// The label is the text after the keyword with one pair of enclosing
/// parentheses removed, provided the text inside them parses on its own.
fn parse_guard(text: &str,
               keyword: &str,
               line: usize,
               parse_label: fn(&str, usize) -> ParseResult<Action>)
               -> ParseResult<Guard> {
    let rest = text.strip_prefix(keyword).unwrap_or(text).trim();
    if let Some(inner) = strip_parentheses(rest)
       && let Ok(action) = parse_label(inner, line)
    {
        return Ok(Guard { label: inner.to_string(),
                          action });
    }
    let action = parse_label(rest, line)?;
    Ok(Guard { label: rest.to_string(),
               action })
}

/// Removes one pair of enclosing ASCII or full-width parentheses.
fn strip_parentheses(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('(').or_else(|| text.strip_prefix('（'))?;
    let inner = inner.strip_suffix(')').or_else(|| inner.strip_suffix('）'))?;
    Some(inner.trim())
}

/// A line that fits no other form is read as a formula. Unbalanced
/// delimiters and malformed calls keep their own error; text that is not a
/// formula at all is unrecognized.
fn parse_bare_formula(text: &str, line: usize) -> ParseResult<Action> {
    let unrecognized = |error: ParseError| match error {
        ParseError::InvalidFormula { .. } => {
            ParseError::UnrecognizedStatement { text: text.to_string(),
                                                line }
        },
        other => other,
    };
    parse_formula(text, line).map(Action::Formula).map_err(unrecognized)
}

/// Parses `for` header tokens: `v を from から to まで [step (ずつ増やす|ずつ減らす)]`.
fn parse_for_header<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<ForHeader>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let invalid = || ParseError::InvalidForHeader { line };
    let variable = parse_identifier(tokens)?;
    consume(tokens, &Token::Wo).ok_or_else(invalid)?;
    let from = parse_expression(tokens)?;
    consume(tokens, &Token::From).ok_or_else(invalid)?;
    let to = parse_expression(tokens)?;
    consume(tokens, &Token::To).ok_or_else(invalid)?;

    let (step, direction) = if tokens.peek().is_none() {
        (Expr::Literal { value: LiteralValue::Integer(1),
                         line },
         Direction::Increase)
    } else {
        let step = parse_expression(tokens)?;
        let direction = if consume(tokens, &Token::Increase).is_some() {
            Direction::Increase
        } else if consume(tokens, &Token::Decrease).is_some() {
            Direction::Decrease
        } else {
            return Err(invalid());
        };
        (step, direction)
    };
    expect_end(tokens)?;

    Ok(ForHeader { variable,
                   from,
                   to,
                   step,
                   direction,
                   line })
}

/// Parses `return [expr]`.
fn parse_return<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Action>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    tokens.next();
    if tokens.peek().is_none() {
        return Ok(Action::Return(None));
    }
    let expr = parse_expression(tokens)?;
    expect_end(tokens)?;
    Ok(Action::Return(Some(expr)))
}

/// Parses `<type>: name [← value], name [← value], ...`.
fn parse_declaration<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Action>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let (declared, line) = match tokens.next() {
        Some((Token::Type(declared), line)) => (*declared, *line),
        _ => return Err(ParseError::InvalidDeclaration { line: 0 }),
    };
    consume(tokens, &Token::Colon).ok_or(ParseError::InvalidDeclaration { line })?;

    let mut entries = Vec::new();
    loop {
        let name = parse_identifier(tokens)?;
        let value = if consume(tokens, &Token::Assign).is_some() {
            Some(parse_expression(tokens)?)
        } else {
            None
        };
        entries.push((name, value));
        if consume(tokens, &Token::Comma).is_none() {
            break;
        }
    }
    if tokens.peek().is_some() {
        return Err(ParseError::InvalidDeclaration { line });
    }

    Ok(Action::Declare(Declaration { declared,
                                     entries,
                                     line }))
}

/// Parses the target of an assignment or append: a name and its indices.
fn parse_target<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<(String, Vec<Expr>)>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let target = parse_identifier(tokens)?;
    let mut indices = Vec::new();
    while let Some(line) = consume(tokens, &Token::LBracket) {
        indices.push(parse_expression(tokens)?);
        consume(tokens, &Token::RBracket).ok_or(ParseError::UnmatchedBracket { line })?;
    }
    Ok((target, indices))
}

/// Parses `name[index]... ← value`.
fn parse_assignment<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Action>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let (target, indices) = parse_target(tokens)?;
    let line = consume(tokens, &Token::Assign).ok_or(ParseError::InvalidAssignment { line: 0 })?;
    let value = parse_expression(tokens)?;
    if tokens.peek().is_some() {
        return Err(ParseError::InvalidAssignment { line });
    }
    Ok(Action::Assign(Assignment { target,
                                   indices,
                                   value,
                                   line }))
}

/// Parses `name[index]... の末尾に value を追加する`.
fn parse_append<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Action>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let (target, indices) = parse_target(tokens)?;
    let line = consume(tokens, &Token::TailOf).ok_or(ParseError::InvalidAppend { line: 0 })?;
    let value = parse_expression(tokens)?;
    consume(tokens, &Token::AppendVerb).ok_or(ParseError::InvalidAppend { line })?;
    if tokens.peek().is_some() {
        return Err(ParseError::InvalidAppend { line });
    }
    Ok(Action::Append(Assignment { target,
                                   indices,
                                   value,
                                   line }))
}

/// Parses `○[type:] name(type: param, ...)`.
fn parse_signature<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<FunctionSignature>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let line = consume(tokens, &Token::FunctionMarker).unwrap_or_default();
    let invalid = |details: &str| ParseError::InvalidFunctionDeclaration { details: details.to_string(),
                                                                           line };

    let return_type = match tokens.peek() {
        Some((Token::Type(declared), _)) => {
            let declared = *declared;
            tokens.next();
            consume(tokens, &Token::Colon).ok_or_else(|| invalid("expected ':' after the return type"))?;
            Some(declared)
        },
        _ => None,
    };
    let name = parse_identifier(tokens)?;
    consume(tokens, &Token::LParen).ok_or_else(|| invalid("expected '(' after the function name"))?;
    let params = parse_comma_separated(tokens, parse_parameter, &Token::RParen)
                     .map_err(|e| match e {
                         ParseError::UnexpectedEndOfInput { .. } => {
                             ParseError::UnmatchedParenthesis { line }
                         },
                         e => e,
                     })?;
    if tokens.peek().is_some() {
        return Err(invalid("unexpected text after the parameter list"));
    }

    Ok(FunctionSignature { name,
                           return_type,
                           params,
                           line })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BaseType, DeclaredType};

    fn simple(text: &str) -> Action {
        match parse_statement(text, 1).unwrap() {
            Statement::Simple(action) => action,
            other => panic!("expected a simple statement, got {other:?}"),
        }
    }

    #[test]
    fn declarations_with_several_names() {
        let Action::Declare(declaration) = simple("整数型の配列: a ← {1, 2}, b") else {
            panic!("expected a declaration");
        };
        assert_eq!(declaration.declared,
                   DeclaredType { base:      BaseType::Integer,
                                  dimension: 1, });
        assert_eq!(declaration.entries.len(), 2);
        assert!(declaration.entries[1].1.is_none());
    }

    #[test]
    fn assignment_and_append_are_told_apart() {
        assert!(matches!(simple("a[i + 1][2] ← 3"), Action::Assign(a) if a.indices.len() == 2));
        assert!(matches!(simple("a の末尾に x * 2 を追加する"), Action::Append(_)));
        assert!(matches!(simple("f(a[1])"), Action::Formula(_)));
        assert!(matches!(simple("return"), Action::Return(None)));
        assert!(matches!(simple("return n * f(n - 1)"), Action::Return(Some(_))));
    }

    #[test]
    fn block_keywords() {
        assert_eq!(parse_statement("endwhile", 1).unwrap(), Statement::EndWhile);
        assert_eq!(parse_statement("do", 1).unwrap(), Statement::Do);
        let Statement::For(guard) = parse_statement("for (i を 1 から 10 まで 2 ずつ増やす)", 1).unwrap() else {
            panic!("expected a for header");
        };
        assert_eq!(guard.label, "i を 1 から 10 まで 2 ずつ増やす");
        let Action::For(header) = guard.action else {
            panic!("expected a parsed header");
        };
        assert_eq!(header.variable, "i");
        assert_eq!(header.direction, Direction::Increase);
    }

    #[test]
    fn conditions_keep_inner_parentheses_when_needed() {
        let Statement::While(guard) = parse_statement("while (a) < (b)", 1).unwrap() else {
            panic!("expected a while header");
        };
        assert_eq!(guard.label, "(a) < (b)");
    }

    #[test]
    fn function_headers() {
        let Statement::Function(signature) =
            parse_statement("○整数型: gcd(整数型: a, 整数型: b)", 1).unwrap()
        else {
            panic!("expected a function header");
        };
        assert_eq!(signature.name, "gcd");
        assert_eq!(signature.params.len(), 2);
        assert!(signature.return_type.is_some());
        assert!(matches!(parse_statement("○f(n)", 4),
                         Err(ParseError::InvalidFunctionDeclaration { line: 4, .. })));
    }

    #[test]
    fn malformed_lines() {
        assert_eq!(parse_statement("x ← ", 3), Err(ParseError::UnexpectedEndOfInput { line: 3 }));
        assert_eq!(parse_statement("for (i を 1 まで 3)", 5),
                   Err(ParseError::InvalidForHeader { line: 5 }));
        assert!(matches!(parse_statement("x y z", 2),
                         Err(ParseError::UnrecognizedStatement { line: 2, .. })));
        assert!(matches!(parse_statement("endif now", 2),
                         Err(ParseError::UnrecognizedStatement { .. })));
        assert_eq!(parse_statement("f(1", 7), Err(ParseError::UnmatchedParenthesis { line: 7 }));
        assert_eq!(parse_statement("a[1", 8), Err(ParseError::UnmatchedBracket { line: 8 }));
        assert_eq!(parse_statement("整数型 x", 6), Err(ParseError::InvalidDeclaration { line: 6 }));
    }
}
