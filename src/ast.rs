use std::fmt;

use serde::{Deserialize, Serialize};

/// A literal written directly in a formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralValue {
    /// An integer literal such as `42`.
    Integer(i64),
    /// A real literal such as `3.5`.
    Real(f64),
    /// `true` or `false`.
    Bool(bool),
    /// The `未定義` literal.
    Undefined,
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Represents a formula as a tree.
///
/// Each node remembers the source line it was parsed from so that runtime
/// errors can point back to the statement. Formulas never span lines, so all
/// nodes of one tree share the same line.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value.
    Literal {
        /// The literal.
        value: LiteralValue,
        /// The source line.
        line:  usize,
    },
    /// A variable reference.
    Variable {
        /// The variable name.
        name: String,
        /// The source line.
        line: usize,
    },
    /// A call of a user-defined function.
    FunctionCall {
        /// The function name.
        name:      String,
        /// The argument formulas, in order.
        arguments: Vec<Self>,
        /// The source line.
        line:      usize,
    },
    /// A bracketed array literal `{a, b, ...}`.
    ArrayLiteral {
        /// The element formulas.
        elements: Vec<Self>,
        /// The source line.
        line:     usize,
    },
    /// 1-based element access `array[index]`.
    ArrayIndex {
        /// The indexed formula.
        array: Box<Self>,
        /// The index formula.
        index: Box<Self>,
        /// The source line.
        line:  usize,
    },
    /// A size suffix such as `の要素数`.
    Size {
        /// The measured formula.
        array:   Box<Self>,
        /// Which dimension is measured.
        measure: SizeMeasure,
        /// The source line.
        line:    usize,
    },
    /// A prefix operator.
    UnaryOp {
        /// The operator.
        op:   UnaryOperator,
        /// The operand.
        expr: Box<Self>,
        /// The source line.
        line: usize,
    },
    /// A binary arithmetic, bitwise or logical operator.
    BinaryOp {
        /// The left operand.
        left:  Box<Self>,
        /// The operator.
        op:    BinaryOperator,
        /// The right operand.
        right: Box<Self>,
        /// The source line.
        line:  usize,
    },
    /// A chain of relations `a < b < c`.
    ///
    /// The chain holds when every adjacent pair holds; each operand is
    /// evaluated once.
    Comparison {
        /// The leftmost operand.
        first: Box<Self>,
        /// Each relation together with its right operand.
        links: Vec<(ComparisonOperator, Self)>,
        /// The source line.
        line:  usize,
    },
}

impl Expr {
    /// Returns the source line of the node.
    #[must_use]
    pub const fn line_number(&self) -> usize {
        match self {
            Self::Literal { line, .. }
            | Self::Variable { line, .. }
            | Self::FunctionCall { line, .. }
            | Self::ArrayLiteral { line, .. }
            | Self::ArrayIndex { line, .. }
            | Self::Size { line, .. }
            | Self::UnaryOp { line, .. }
            | Self::BinaryOp { line, .. }
            | Self::Comparison { line, .. } => *line,
        }
    }

    /// Visits every function call in the tree, outermost first.
    pub fn for_each_call<'a>(&'a self, visit: &mut impl FnMut(&'a str, usize, usize)) {
        match self {
            Self::Literal { .. } | Self::Variable { .. } => {},
            Self::FunctionCall { name, arguments, line } => {
                visit(name, arguments.len(), *line);
                for argument in arguments {
                    argument.for_each_call(visit);
                }
            },
            Self::ArrayLiteral { elements, .. } => {
                for element in elements {
                    element.for_each_call(visit);
                }
            },
            Self::ArrayIndex { array, index, .. } => {
                array.for_each_call(visit);
                index.for_each_call(visit);
            },
            Self::Size { array: expr, .. } | Self::UnaryOp { expr, .. } => expr.for_each_call(visit),
            Self::BinaryOp { left, right, .. } => {
                left.for_each_call(visit);
                right.for_each_call(visit);
            },
            Self::Comparison { first, links, .. } => {
                first.for_each_call(visit);
                for (_, operand) in links {
                    operand.for_each_call(visit);
                }
            },
        }
    }
}

/// Writes the tree as a prefix S-expression, e.g. `(+ 1 (* 2 3))`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal { value, .. } => match value {
                LiteralValue::Integer(i) => write!(f, "{i}"),
                LiteralValue::Real(r) => write!(f, "{r:?}"),
                LiteralValue::Bool(b) => write!(f, "{b}"),
                LiteralValue::Undefined => write!(f, "未定義"),
            },
            Self::Variable { name, .. } => write!(f, "{name}"),
            Self::FunctionCall { name, arguments, .. } => {
                write!(f, "({name}")?;
                for argument in arguments {
                    write!(f, " {argument}")?;
                }
                write!(f, ")")
            },
            Self::ArrayLiteral { elements, .. } => {
                write!(f, "{{")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "}}")
            },
            Self::ArrayIndex { array, index, .. } => write!(f, "([] {array} {index})"),
            Self::Size { array, measure, .. } => write!(f, "({measure} {array})"),
            Self::UnaryOp { op, expr, .. } => write!(f, "({op} {expr})"),
            Self::BinaryOp { left, op, right, .. } => write!(f, "({op} {left} {right})"),
            Self::Comparison { first, links, .. } => {
                write!(f, "(chain {first}")?;
                for (op, operand) in links {
                    write!(f, " {op} {operand}")?;
                }
                write!(f, ")")
            },
        }
    }
}

/// Arithmetic, bitwise and logical operators.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOperator {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`, always a real quotient.
    Div,
    /// `÷ ... の商`, the floored quotient.
    FloorDiv,
    /// `mod` or `÷ ... の余り`, the floored remainder.
    Mod,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `かつ`
    And,
    /// `または`
    Or,
}

impl BinaryOperator {
    /// Returns the precedence class of the operator.
    #[must_use]
    pub const fn class(self) -> OperatorClass {
        match self {
            Self::Add | Self::Sub => OperatorClass::Additive,
            Self::Mul | Self::Div | Self::FloorDiv | Self::Mod => OperatorClass::Multiplicative,
            Self::BitAnd => OperatorClass::BitAnd,
            Self::BitOr => OperatorClass::BitOr,
            Self::And => OperatorClass::And,
            Self::Or => OperatorClass::Or,
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operator = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "div",
            Self::Mod => "mod",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::And => "and",
            Self::Or => "or",
        };
        write!(f, "{operator}")
    }
}

/// Relations usable in a comparison chain.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ComparisonOperator {
    /// `<`, `より小さい`, `未満`
    Less,
    /// `>`, `より大きい`
    Greater,
    /// `≦`, `以下`
    LessEqual,
    /// `≧`, `以上`
    GreaterEqual,
    /// `=`, `と等しい`, `である`
    Equal,
    /// `≠`, `と等しくない`, `でない`
    NotEqual,
    /// `で割り切れる`
    Divisible,
    /// `で割り切れない`
    NotDivisible,
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operator = match self {
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Divisible => "divisible",
            Self::NotDivisible => "not-divisible",
        };
        write!(f, "{operator}")
    }
}

/// Precedence classes of binary operators, loosest first.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OperatorClass {
    /// `または`
    Or,
    /// `かつ`
    And,
    /// `|`
    BitOr,
    /// `&`
    BitAnd,
    /// Relations and the `が` phrase.
    Relational,
    /// `+ -`
    Additive,
    /// `* / mod`
    Multiplicative,
}

impl OperatorClass {
    /// Returns the classes that bind more tightly than this one.
    ///
    /// An operator following the right operand of `self` is consumed first
    /// exactly when its class is listed here.
    #[must_use]
    pub const fn superiors(self) -> &'static [Self] {
        use OperatorClass::{Additive, And, BitAnd, BitOr, Multiplicative, Relational};
        match self {
            Self::Multiplicative => &[],
            Self::Additive => &[Multiplicative],
            Self::Relational => &[Multiplicative, Additive],
            Self::BitAnd => &[Multiplicative, Additive, Relational],
            Self::BitOr => &[Multiplicative, Additive, Relational, BitAnd],
            Self::And => &[Multiplicative, Additive, Relational, BitAnd, BitOr],
            Self::Or => &[Multiplicative, Additive, Relational, BitAnd, BitOr, And],
        }
    }

    /// Returns whether `other` binds more tightly than `self`.
    #[must_use]
    pub fn is_outranked_by(self, other: Self) -> bool {
        self.superiors().contains(&other)
    }
}

/// Prefix operators; they bind tighter than every binary operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnaryOperator {
    /// `-`
    Negate,
    /// `+`
    Plus,
    /// `not`
    Not,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negate => write!(f, "neg"),
            Self::Plus => write!(f, "pos"),
            Self::Not => write!(f, "not"),
        }
    }
}

/// The dimension measured by a size suffix.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SizeMeasure {
    /// `の要素数`
    Elements,
    /// `の行数`
    Rows,
    /// `の列数`
    Columns,
}

impl fmt::Display for SizeMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elements => write!(f, "len"),
            Self::Rows => write!(f, "rows"),
            Self::Columns => write!(f, "cols"),
        }
    }
}

/// The element type named by a type keyword.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BaseType {
    /// `整数型`
    Integer,
    /// `実数型`
    Real,
    /// `文字列型`
    String,
    /// `論理型`
    Boolean,
}

/// A declared variable type such as `整数型の二次元配列`.
///
/// Types are advisory: only the distinction between arrays and scalars is
/// enforced on assignment.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DeclaredType {
    /// The element type.
    pub base:      BaseType,
    /// `0` for scalars, `1` for `の配列`, `2` for `の二次元配列`.
    pub dimension: usize,
}

impl DeclaredType {
    /// Returns whether the type names an array.
    #[must_use]
    pub const fn is_array(self) -> bool {
        self.dimension > 0
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.base {
            BaseType::Integer => "整数型",
            BaseType::Real => "実数型",
            BaseType::String => "文字列型",
            BaseType::Boolean => "論理型",
        };
        let suffix = match self.dimension {
            0 => "",
            1 => "の配列",
            _ => "の二次元配列",
        };
        write!(f, "{base}{suffix}")
    }
}

impl std::str::FromStr for DeclaredType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, rest) = [("整数型", BaseType::Integer),
                            ("実数型", BaseType::Real),
                            ("文字列型", BaseType::String),
                            ("論理型", BaseType::Boolean)].into_iter()
                                                           .find_map(|(keyword, base)| {
                                                               s.strip_prefix(keyword)
                                                                .map(|rest| (base, rest))
                                                           })
                                                           .ok_or_else(|| {
                                                               format!("unknown type '{s}'")
                                                           })?;
        let dimension = match rest {
            "" => 0,
            "の配列" => 1,
            "の二次元配列" => 2,
            _ => return Err(format!("unknown type '{s}'")),
        };
        Ok(Self { base, dimension })
    }
}

impl From<DeclaredType> for String {
    fn from(value: DeclaredType) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for DeclaredType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A declaration `<type>: name [← value], ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// The declared type shared by every name.
    pub declared: DeclaredType,
    /// Each declared name with its optional initial value.
    pub entries:  Vec<(String, Option<Expr>)>,
    /// The source line.
    pub line:     usize,
}

/// A store into a variable or array element, or an append to an array.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// The variable name.
    pub target:  String,
    /// Index formulas applied to the variable, outermost first.
    pub indices: Vec<Expr>,
    /// The stored value.
    pub value:   Expr,
    /// The source line.
    pub line:    usize,
}

/// Direction of a counted loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    /// `ずつ増やす`
    Increase,
    /// `ずつ減らす`
    Decrease,
}

/// A loop header `v を from から to まで step ずつ増やす`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForHeader {
    /// The loop variable.
    pub variable:  String,
    /// The first value.
    pub from:      Expr,
    /// The bound, inclusive.
    pub to:        Expr,
    /// The magnitude of each step.
    pub step:      Expr,
    /// Whether the loop counts up or down.
    pub direction: Direction,
    /// The source line.
    pub line:      usize,
}

/// A function header `○[type:] name(type: param, ...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    /// The function name.
    pub name:        String,
    /// The declared return type, if any.
    pub return_type: Option<DeclaredType>,
    /// Formal parameters in order.
    pub params:      Vec<(String, DeclaredType)>,
    /// The source line.
    pub line:        usize,
}

/// The parsed form of a transition label.
///
/// Labels are kept as source text on the machine; the action is what the
/// engine actually executes when the transition fires.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// An unconditional edge such as `else`, `endif` or a loop back edge.
    Pass,
    /// A variable declaration.
    Declare(Declaration),
    /// A store into a variable or element.
    Assign(Assignment),
    /// An append to the tail of an array.
    Append(Assignment),
    /// A formula evaluated for its calls only.
    Formula(Expr),
    /// A branch or loop guard.
    Condition(Expr),
    /// A counted loop header.
    For(ForHeader),
    /// A return with an optional result.
    Return(Option<Expr>),
}

impl Action {
    /// Visits every function call made by the action.
    pub fn for_each_call<'a>(&'a self, visit: &mut impl FnMut(&'a str, usize, usize)) {
        match self {
            Self::Pass | Self::Return(None) => {},
            Self::Declare(declaration) => {
                for expr in declaration.entries.iter().filter_map(|(_, value)| value.as_ref()) {
                    expr.for_each_call(visit);
                }
            },
            Self::Assign(assignment) | Self::Append(assignment) => {
                for index in &assignment.indices {
                    index.for_each_call(visit);
                }
                assignment.value.for_each_call(visit);
            },
            Self::Formula(expr) | Self::Condition(expr) | Self::Return(Some(expr)) => {
                expr.for_each_call(visit);
            },
            Self::For(header) => {
                header.from.for_each_call(visit);
                header.to.for_each_call(visit);
                header.step.for_each_call(visit);
            },
        }
    }
}
