use std::iter::Peekable;

use crate::{
    ast::{BinaryOperator, ComparisonOperator, Expr, LiteralValue, OperatorClass},
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{core::ParseResult, unary::parse_unary},
    },
};

/// An operator token as seen between two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    /// Arithmetic, bitwise or logical.
    Binary(BinaryOperator),
    /// A symbolic relation.
    Relation(ComparisonOperator),
    /// `が`; the relation follows the right operand.
    Phrase,
}

impl Operator {
    const fn class(self) -> OperatorClass {
        match self {
            Self::Binary(op) => op.class(),
            Self::Relation(_) | Self::Phrase => OperatorClass::Relational,
        }
    }
}

/// Combines `left` with the operators that follow it.
///
/// Each operator class has a fixed set of classes that bind more tightly
/// (see [`OperatorClass::superiors`]). After reading an operator and its right
/// operand, the next operator is inspected: if it outranks the current one,
/// the right operand is first extended by a recursive call that carries the
/// current class as `pending`. A call with a pending class stops as soon as it
/// meets an operator that does not outrank that class, leaving it for the
/// caller. Operators of equal rank therefore associate to the left.
///
/// Adjacent relations at one level form a single comparison chain, so
/// `a < b < c` is one [`Expr::Comparison`] with two links.
///
/// # Parameters
/// - `tokens`: Token stream positioned after `left`.
/// - `left`: The operand parsed so far.
/// - `pending`: The class of the operator waiting for this result, if any.
///
/// # Returns
/// The combined expression.
///
/// # Errors
/// Propagates operand errors; fails on a `が` phrase without a predicate.
pub fn parse_operators<'a, I>(tokens: &mut Peekable<I>,
                              mut left: Expr,
                              pending: Option<OperatorClass>)
                              -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut chained = false;
    while let Some((token, line)) = tokens.peek()
          && let Some(op) = token_to_operator(token)
    {
        if let Some(pending) = pending
           && !pending.is_outranked_by(op.class())
        {
            break;
        }
        tokens.next();

        let mut right = parse_unary(tokens)?;
        if let Some((next, _)) = tokens.peek()
           && let Some(next) = token_to_operator(next)
           && op.class().is_outranked_by(next.class())
        {
            right = parse_operators(tokens, right, Some(op.class()))?;
        }

        left = match op {
            Operator::Binary(op) => {
                chained = false;
                Expr::BinaryOp { left: Box::new(left),
                                 op: division_suffix(tokens, op),
                                 right: Box::new(right),
                                 line: *line }
            },
            Operator::Relation(relation) => {
                let chain = link(left, relation, right, chained, *line);
                chained = true;
                chain
            },
            Operator::Phrase => {
                let relation = parse_predicate(tokens, &right, *line)?;
                let chain = link(left, relation, right, chained, *line);
                chained = true;
                chain
            },
        };
    }
    Ok(left)
}

/// Appends a relation to the chain built at this level, or starts a new one.
fn link(left: Expr,
        relation: ComparisonOperator,
        right: Expr,
        chained: bool,
        line: usize)
        -> Expr {
    match left {
        Expr::Comparison { first, mut links, line } if chained => {
            links.push((relation, right));
            Expr::Comparison { first, links, line }
        },
        left => Expr::Comparison { first: Box::new(left),
                                   links: vec![(relation, right)],
                                   line },
    }
}

/// Turns `/` into a floored quotient or remainder when followed by `の商` or
/// `の余り`.
fn division_suffix<'a, I>(tokens: &mut Peekable<I>, op: BinaryOperator) -> BinaryOperator
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    if op != BinaryOperator::Div {
        return op;
    }
    match tokens.peek() {
        Some((Token::Quotient, _)) => {
            tokens.next();
            BinaryOperator::FloorDiv
        },
        Some((Token::Remainder, _)) => {
            tokens.next();
            BinaryOperator::Mod
        },
        _ => op,
    }
}

/// Reads the predicate closing a `が` phrase.
///
/// A bare `x が 未定義` asks whether `x` is undefined.
fn parse_predicate<'a, I>(tokens: &mut Peekable<I>,
                          right: &Expr,
                          line: usize)
                          -> ParseResult<ComparisonOperator>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let relation = match tokens.peek() {
        Some((Token::AtLeast, _)) => ComparisonOperator::GreaterEqual,
        Some((Token::AtMost, _)) => ComparisonOperator::LessEqual,
        Some((Token::GreaterThan, _)) => ComparisonOperator::Greater,
        Some((Token::LessThan, _)) => ComparisonOperator::Less,
        Some((Token::EqualTo, _)) => ComparisonOperator::Equal,
        Some((Token::NotEqualTo, _)) => ComparisonOperator::NotEqual,
        Some((Token::DivisibleBy, _)) => ComparisonOperator::Divisible,
        Some((Token::NotDivisibleBy, _)) => ComparisonOperator::NotDivisible,
        _ if matches!(right,
                      Expr::Literal { value: LiteralValue::Undefined,
                                      .. }) =>
        {
            return Ok(ComparisonOperator::Equal);
        },
        _ => {
            return Err(ParseError::InvalidFormula { details: "'が' must be followed by an operand and a predicate such as '以上'".to_string(),
                                                    line });
        },
    };
    tokens.next();
    Ok(relation)
}

/// Maps a token to the operator it spells, if any.
const fn token_to_operator(token: &Token) -> Option<Operator> {
    use ComparisonOperator::{Equal, Greater, GreaterEqual, Less, LessEqual, NotEqual};
    match token {
        Token::Plus => Some(Operator::Binary(BinaryOperator::Add)),
        Token::Minus => Some(Operator::Binary(BinaryOperator::Sub)),
        Token::Star => Some(Operator::Binary(BinaryOperator::Mul)),
        Token::Slash => Some(Operator::Binary(BinaryOperator::Div)),
        Token::Mod => Some(Operator::Binary(BinaryOperator::Mod)),
        Token::Ampersand => Some(Operator::Binary(BinaryOperator::BitAnd)),
        Token::Pipe => Some(Operator::Binary(BinaryOperator::BitOr)),
        Token::And => Some(Operator::Binary(BinaryOperator::And)),
        Token::Or => Some(Operator::Binary(BinaryOperator::Or)),
        Token::Less => Some(Operator::Relation(Less)),
        Token::Greater => Some(Operator::Relation(Greater)),
        Token::LessEqual => Some(Operator::Relation(LessEqual)),
        Token::GreaterEqual => Some(Operator::Relation(GreaterEqual)),
        Token::Equal => Some(Operator::Relation(Equal)),
        Token::NotEqual => Some(Operator::Relation(NotEqual)),
        Token::Ga => Some(Operator::Phrase),
        _ => None,
    }
}
