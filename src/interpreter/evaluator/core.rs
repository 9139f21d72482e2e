use crate::{
    ast::{Expr, LiteralValue},
    error::RuntimeError,
    interpreter::{evaluator::function::CallHandler, value::core::Value},
    lts::store::VariableStore,
};

/// Result type used by the evaluator.
///
/// All evaluation functions return either a value of type `T` or a
/// `RuntimeError` describing the failure.
pub type EvalResult<T> = Result<T, RuntimeError>;

/// Stores the runtime evaluation context.
///
/// A context borrows the variables of the machine being executed and the
/// handler that services function calls. It is created for a single action
/// and dropped afterwards, so evaluation never outlives the machine state it
/// reads.
///
/// ## Usage
///
/// ```
/// use gijigo::{
///     interpreter::{
///         evaluator::{core::Context, function::NoCalls},
///         parser::core::parse_formula,
///         value::core::Value,
///     },
///     lts::store::VariableStore,
/// };
///
/// let mut store = VariableStore::new();
/// store.set("x", Value::Integer(4));
///
/// let expr = parse_formula("x * 2 + 1", 1).unwrap();
/// let mut no_calls = NoCalls;
/// let mut context = Context::new(&mut store, &mut no_calls);
/// assert_eq!(context.eval(&expr).unwrap(), Value::Integer(9));
/// ```
pub struct Context<'a> {
    /// The variables of the executing machine.
    pub store: &'a mut VariableStore,
    /// Services calls of user-defined functions.
    pub calls: &'a mut dyn CallHandler,
}

impl<'a> Context<'a> {
    /// Creates a context over `store` that routes calls to `calls`.
    pub fn new(store: &'a mut VariableStore, calls: &'a mut dyn CallHandler) -> Self {
        Self { store, calls }
    }

    /// Evaluates a formula and returns the resulting value.
    ///
    /// This is the main entry point for formula evaluation. Operands are
    /// evaluated left to right and every operand of an operator is evaluated,
    /// so calls inside a formula run in reading order.
    ///
    /// # Parameters
    /// - `expr`: Formula to evaluate.
    ///
    /// # Errors
    /// Any `RuntimeError` raised by an operator, an access or a call.
    pub fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(Self::eval_literal(*value)),
            Expr::Variable { name, line } => self.eval_variable(name, *line),
            Expr::FunctionCall { name,
                                 arguments,
                                 line, } => {
                let arguments = self.eval_all(arguments)?;
                self.calls.call(name, arguments, *line)
            },
            Expr::ArrayLiteral { elements, .. } => Ok(Value::from(self.eval_all(elements)?)),
            Expr::ArrayIndex { array, index, line } => {
                let array = self.eval(array)?;
                let index = self.eval(index)?;
                Self::eval_array_index(&array, &index, *line)
            },
            Expr::Size { array,
                         measure,
                         line, } => {
                let array = self.eval(array)?;
                Self::eval_size(&array, *measure, *line)
            },
            Expr::UnaryOp { op, expr, line } => {
                let operand = self.eval(expr)?;
                Self::eval_unary(*op, &operand, *line)
            },
            Expr::BinaryOp { left,
                             op,
                             right,
                             line, } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Self::eval_binary(*op, &left, &right, *line)
            },
            Expr::Comparison { first, links, line } => self.eval_chain(first, links, *line),
        }
    }

    /// Evaluates a list of formulas in order.
    ///
    /// # Errors
    /// The first error raised by any of the formulas.
    pub fn eval_all(&mut self, exprs: &[Expr]) -> EvalResult<Vec<Value>> {
        exprs.iter().map(|expr| self.eval(expr)).collect()
    }

    fn eval_literal(value: LiteralValue) -> Value {
        Value::from(value)
    }

    /// Looks up a variable.
    ///
    /// A declared variable that was never assigned reads as `未定義`; a name
    /// that was never bound at all is an error.
    fn eval_variable(&self, name: &str, line: usize) -> EvalResult<Value> {
        self.store
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownVariable { name: name.to_string(),
                                                           line })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::{evaluator::function::NoCalls, parser::core::parse_formula};

    fn eval(source: &str) -> EvalResult<Value> {
        let mut store = VariableStore::new();
        let expr = parse_formula(source, 1).unwrap();
        Context::new(&mut store, &mut NoCalls).eval(&expr)
    }

    #[test]
    fn arithmetic_follows_precedence() {
        assert_eq!(eval("(1+2)*3-4"), Ok(Value::Integer(5)));
        assert_eq!(eval("1*2*3/4"), Ok(Value::Real(1.5)));
        assert_eq!(eval("24/2/3-4"), Ok(Value::Real(0.0)));
        assert_eq!(eval("2 + 3 * 4 * 4 - 2"), Ok(Value::Integer(48)));
    }

    #[test]
    fn comparison_chains_hold_pairwise() {
        assert_eq!(eval("2 < 3 < 4"), Ok(Value::Bool(true)));
        assert_eq!(eval("2 < 3 > 4"), Ok(Value::Bool(false)));
        assert_eq!(eval("5 が 2 以上"), Ok(Value::Bool(true)));
    }

    #[test]
    fn unbound_names_fail() {
        assert_eq!(eval("y + 1"),
                   Err(RuntimeError::UnknownVariable { name: "y".into(),
                                                       line: 1, }));
    }

    #[test]
    fn declared_but_unset_reads_undefined() {
        let mut store = VariableStore::new();
        store.declare("x", "整数型".parse().unwrap(), Value::Undefined);
        let expr = parse_formula("x = 未定義", 1).unwrap();
        let result = Context::new(&mut store, &mut NoCalls).eval(&expr);
        assert_eq!(result, Ok(Value::Bool(true)));
    }

    #[test]
    fn calls_without_handler_fail() {
        assert_eq!(eval("f(1)"),
                   Err(RuntimeError::UnknownFunction { name: "f".into(),
                                                       line: 1, }));
    }
}
