use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::{
    ast::{Action, BinaryOperator, ComparisonOperator, Direction, ForHeader},
    error::{LtsError, RuntimeError},
    interpreter::{
        evaluator::{
            core::{Context, EvalResult},
            function::CallHandler,
        },
        value::core::Value,
    },
    lts::{
        core::{Lts, StateType, Transition},
        store::VariableStore,
    },
};

/// What happened when a state fired.
#[derive(Debug, Clone, PartialEq)]
pub enum Fired {
    /// Control moved to the named state.
    Moved(String),
    /// The machine returned; `terminal` is the state the return leads to.
    Returned {
        /// The returned value; `None` for a bare or implicit `return`.
        value:    Option<Value>,
        /// The terminal state.
        terminal: String,
    },
    /// The state has no way out.
    Halted,
}

/// Fires `state` once.
///
/// The state's type decides how its outgoing transitions are read:
/// - untyped states follow their first transition, if any;
/// - `Declare`, `Assign` and `Formula` execute their statement and move on;
/// - `If` and `While` try their conditions in insertion order, taking the
///   first that holds or the first sentinel reached;
/// - `For` advances its counter and chooses between body and `endfor`;
/// - `Return` evaluates the returned formula.
///
/// Statements leave the store untouched when they fail.
///
/// # Errors
/// Any runtime error of the statement, or an `LtsError` when the machine is
/// inconsistent.
pub fn fire(lts: &Lts,
            state: &str,
            store: &mut VariableStore,
            calls: &mut dyn CallHandler)
            -> EvalResult<Fired> {
    let current = lts.state(state)?;
    let transitions = &current.transitions;

    match current.kind {
        StateType::Undefined => {
            Ok(transitions.first().map_or(Fired::Halted, |t| Fired::Moved(t.target.clone())))
        },
        StateType::Declare | StateType::Assign | StateType::Formula => {
            let transition = single(state, transitions)?;
            let mut context = Context::new(store, calls);
            match linked(state, transition)? {
                Action::Declare(declaration) => context.declare(declaration)?,
                Action::Assign(assignment) => context.assign(assignment)?,
                Action::Append(assignment) => context.append(assignment)?,
                Action::Formula(expr) | Action::Condition(expr) => {
                    context.eval(expr)?;
                },
                Action::Pass => {},
                Action::For(_) | Action::Return(_) => return Err(misplaced(state, transition)),
            }
            Ok(Fired::Moved(transition.target.clone()))
        },
        StateType::If | StateType::While => {
            for transition in transitions {
                match linked(state, transition)? {
                    Action::Condition(expr) => {
                        let holds = Context::new(store, calls).eval(expr)?
                                                              .as_bool(expr.line_number())?;
                        if holds {
                            return Ok(Fired::Moved(transition.target.clone()));
                        }
                    },
                    Action::Pass => return Ok(Fired::Moved(transition.target.clone())),
                    _ => return Err(misplaced(state, transition)),
                }
            }
            Ok(Fired::Halted)
        },
        StateType::For => fire_for(state, transitions, store, calls),
        StateType::Return => {
            let transition = single(state, transitions)?;
            let value = match linked(state, transition)? {
                Action::Return(Some(expr)) => Some(Context::new(store, calls).eval(expr)?),
                Action::Return(None) | Action::Pass => None,
                _ => return Err(misplaced(state, transition)),
            };
            Ok(Fired::Returned { value,
                                 terminal: transition.target.clone() })
        },
    }
}

/// Fires a counted loop header.
///
/// The loop variable is unbound (or `未定義`) exactly when the loop is
/// entered afresh: it is then set to the first value and the body runs once
/// without consulting the bound. On every later visit it advances by one step,
/// and when the advanced value would pass the bound the variable is released
/// and the `endfor` transition is taken.
fn fire_for(state: &str,
            transitions: &[Transition],
            store: &mut VariableStore,
            calls: &mut dyn CallHandler)
            -> EvalResult<Fired> {
    let body = transitions.iter()
                          .find(|t| t.label != "endfor")
                          .ok_or_else(|| missing(state, "for"))?;
    let exit = transitions.iter()
                          .find(|t| t.label == "endfor")
                          .ok_or_else(|| missing(state, "endfor"))?;
    let Action::For(header) = linked(state, body)? else {
        return Err(misplaced(state, body));
    };
    let ForHeader { variable,
                    from,
                    to,
                    step,
                    direction,
                    line, } = header;
    let line = *line;

    let mut context = Context::new(store, calls);
    let from = context.eval(from)?;
    let to = context.eval(to)?;
    let step = context.eval(step)?;
    if step.loosely_equals(&Value::Integer(0), line)? {
        return Err(RuntimeError::ZeroStep { line });
    }

    let (advance, within) = match direction {
        Direction::Increase => (BinaryOperator::Add, ComparisonOperator::LessEqual),
        Direction::Decrease => (BinaryOperator::Sub, ComparisonOperator::GreaterEqual),
    };
    let Some(current) = store.get(variable).filter(|value| !value.is_undefined()) else {
        store.set(variable, from);
        return Ok(Fired::Moved(body.target.clone()));
    };
    let next = Context::eval_scalar_op(advance, current, &step, line)?;

    if Context::eval_relation(within, &next, &to, line)? {
        store.set(variable, next);
        Ok(Fired::Moved(body.target.clone()))
    } else {
        store.unbind(variable);
        Ok(Fired::Moved(exit.target.clone()))
    }
}

/// Runs a machine from its initial state until it returns or halts.
///
/// # Errors
/// The first runtime error raised by any statement.
pub fn run(lts: &Lts,
           store: &mut VariableStore,
           calls: &mut dyn CallHandler)
           -> EvalResult<Option<Value>> {
    let mut state = lts.init_state().to_string();
    loop {
        trace!(state = %state, "fire");
        match fire(lts, &state, store, calls)? {
            Fired::Moved(next) => state = next,
            Fired::Returned { value, .. } => return Ok(value),
            Fired::Halted => return Ok(None),
        }
    }
}

/// Runs every call to completion before the calling statement continues.
///
/// Each call gets a fresh store built from the callee's parameters. The
/// store of the most recent finished call of each function is kept so it
/// can be shown after the run.
pub struct DirectCalls<'p> {
    functions: &'p IndexMap<String, Lts>,
    finished:  IndexMap<String, VariableStore>,
}

impl<'p> DirectCalls<'p> {
    #[must_use]
    pub fn new(functions: &'p IndexMap<String, Lts>) -> Self {
        Self { functions,
               finished: IndexMap::new() }
    }

    /// Returns the final store of the last finished call of each function.
    #[must_use]
    pub fn into_finished(self) -> IndexMap<String, VariableStore> {
        self.finished
    }
}

impl CallHandler for DirectCalls<'_> {
    fn call(&mut self, name: &str, arguments: Vec<Value>, line: usize) -> EvalResult<Value> {
        let functions = self.functions;
        let lts = functions.get(name)
                           .ok_or_else(|| RuntimeError::UnknownFunction { name: name.to_string(),
                                                                          line })?;
        let mut store = lts.store().for_call(name, arguments, line)?;

        debug!(function = name, line, "call");
        let value = run(lts, &mut store, self)?;
        debug!(function = name, "return");

        self.finished.insert(name.to_string(), store);
        Ok(value.unwrap_or(Value::Undefined))
    }
}

/// The transition leaving a statement state.
fn single<'t>(state: &str, transitions: &'t [Transition]) -> EvalResult<&'t Transition> {
    transitions.first().ok_or_else(|| missing(state, ""))
}

/// The parsed form of a transition.
fn linked<'t>(state: &str, transition: &'t Transition) -> EvalResult<&'t Action> {
    transition.action
              .as_ref()
              .ok_or_else(|| {
                  LtsError::Unlinked { state: state.to_string(),
                                       label: transition.label.clone(), }.into()
              })
}

fn missing(state: &str, label: &str) -> RuntimeError {
    LtsError::UnknownTransition { state: state.to_string(),
                                  label: label.to_string(), }.into()
}

fn misplaced(state: &str, transition: &Transition) -> RuntimeError {
    RuntimeError::TypeError { details: format!("'{}' cannot leave state {state}", transition.label),
                              line:    transition.line, }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::core::compile;

    fn execute(source: &str) -> (Option<Value>, VariableStore) {
        let compiled = compile(source).unwrap();
        let mut store = VariableStore::new();
        let mut calls = DirectCalls::new(&compiled.functions);
        let value = run(&compiled.main, &mut store, &mut calls).unwrap();
        (value, store)
    }

    #[test]
    fn for_loop_sums_odd_numbers() {
        let (_, store) = execute("\
整数型: s ← 0
for (v を 1 から 10 まで 2 ずつ増やす)
    s ← s + v
endfor
");
        assert_eq!(store.get("s"), Some(&Value::Integer(25)));
        assert_eq!(store.get("v"), None);
    }

    #[test]
    fn for_loop_counts_down_and_resets_declared_variable() {
        let (_, store) = execute("\
整数型: i, s ← 0
for (i を 5 から 1 まで 2 ずつ減らす)
    s ← s * 10 + i
endfor
");
        assert_eq!(store.get("s"), Some(&Value::Integer(531)));
        assert_eq!(store.get("i"), Some(&Value::Undefined));
    }

    #[test]
    fn nested_loops_restart_inner_counter() {
        let (_, store) = execute("\
整数型: n ← 0
for (i を 1 から 3 まで)
    for (j を 1 から i まで)
        n ← n + 1
    endfor
endfor
");
        assert_eq!(store.get("n"), Some(&Value::Integer(6)));
    }

    #[test]
    fn reversed_range_still_runs_body_once() {
        let (_, store) = execute("整数型: n ← 0\nfor (i を 3 から 1 まで)\n    n ← n + 1\nendfor\n");
        assert_eq!(store.get("n"), Some(&Value::Integer(1)));
        assert_eq!(store.get("i"), None);
    }

    #[test]
    fn branches_take_first_true_condition() {
        let (_, store) = execute("\
整数型: x ← 5, y
if (x > 3)
    y ← 1
elseif (x > 1)
    y ← 2
else
    y ← 3
endif
");
        assert_eq!(store.get("y"), Some(&Value::Integer(1)));
    }

    #[test]
    fn do_while_runs_body_first() {
        let (_, store) = execute("整数型: n ← 10\ndo\n    n ← n + 1\nwhile (n < 5)\n");
        assert_eq!(store.get("n"), Some(&Value::Integer(11)));
    }

    #[test]
    fn recursion_returns_through_calls() {
        let (value, store) = execute("\
○整数型: fact(整数型: n)
    if (n ≦ 1)
        return 1
    endif
    return n * fact(n - 1)
整数型: x ← fact(5)
return x
");
        assert_eq!(store.get("x"), Some(&Value::Integer(120)));
        assert_eq!(value, Some(Value::Integer(120)));
    }

    #[test]
    fn calls_check_argument_count() {
        let compiled = compile("○f(整数型: a)\n    return a\nx ← f(1, 2)\n").unwrap();
        let mut store = VariableStore::new();
        let mut calls = DirectCalls::new(&compiled.functions);
        assert_eq!(run(&compiled.main, &mut store, &mut calls),
                   Err(RuntimeError::ArgumentCountMismatch { name:     "f".into(),
                                                             expected: 1,
                                                             found:    2,
                                                             line:     3, }));
    }

    #[test]
    fn zero_step_is_rejected() {
        let compiled = compile("for (i を 1 から 3 まで 0 ずつ増やす)\nendfor\n").unwrap();
        let mut store = VariableStore::new();
        let mut calls = DirectCalls::new(&compiled.functions);
        assert_eq!(run(&compiled.main, &mut store, &mut calls),
                   Err(RuntimeError::ZeroStep { line: 1 }));
    }
}
