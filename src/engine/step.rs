use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    engine::core::{Fired, fire},
    error::RuntimeError,
    interpreter::{
        evaluator::{core::EvalResult, function::CallHandler},
        value::core::Value,
    },
    lts::{core::Lts, store::VariableStore},
};

/// One active machine: the main program or one call of a function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// The called function; `None` for the main program.
    pub function:     Option<String>,
    /// The state about to fire.
    pub state:        String,
    /// The bindings of this call.
    pub store:        VariableStore,
    /// Results of the calls the current statement has completed so far, in
    /// call order.
    #[serde(default)]
    pub call_results: Vec<Value>,
}

/// The execution position of a program run one transition at a time.
///
/// The last frame is the active one. Once the main program returns, the
/// position is finished and has no frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// The call stack, outermost first.
    pub frames:   Vec<Frame>,
    /// Whether the main program has returned.
    #[serde(default)]
    pub finished: bool,
    /// The value returned by the main program.
    #[serde(default)]
    pub result:   Option<Value>,
}

impl Position {
    /// The position before the first transition of `main`.
    #[must_use]
    pub fn start(main: &Lts) -> Self {
        Self { frames:   vec![Frame { function:     None,
                                      state:        main.init_state().to_string(),
                                      store:        VariableStore::new(),
                                      call_results: Vec::new(), }],
               finished: false,
               result:   None, }
    }

    /// The call stack as `(function, state)` pairs, outermost first. The
    /// main program is reported as `None`.
    #[must_use]
    pub fn call_stack(&self) -> Vec<(Option<&str>, &str)> {
        self.frames
            .iter()
            .map(|frame| (frame.function.as_deref(), frame.state.as_str()))
            .collect()
    }

    /// The active frame, if the program is running.
    #[must_use]
    pub fn active(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

/// What a single step did.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The active frame moved to `state`.
    Moved {
        /// The new state of the active frame.
        state: String,
    },
    /// A statement called `function`; its frame is now active.
    EnteredCall {
        /// The called function.
        function: String,
    },
    /// `function` returned `value` to its caller.
    Returned {
        /// The function that returned.
        function: String,
        /// Its result; `未定義` when nothing was returned.
        value:    Value,
    },
    /// The main program returned.
    Finished {
        /// The value returned by the main program.
        result: Option<Value>,
    },
}

/// Answers calls from the results recorded for the current statement and
/// suspends the statement at the first call without one.
struct ReplayCalls<'r> {
    results: &'r [Value],
    next:    usize,
    pending: Option<(String, Vec<Value>)>,
}

impl CallHandler for ReplayCalls<'_> {
    fn call(&mut self, name: &str, arguments: Vec<Value>, line: usize) -> EvalResult<Value> {
        if let Some(value) = self.results.get(self.next) {
            self.next += 1;
            return Ok(value.clone());
        }
        self.pending = Some((name.to_string(), arguments));
        Err(RuntimeError::CallPending { name: name.to_string(),
                                        line })
    }
}

/// Fires exactly one transition of the active frame.
///
/// A statement that calls a function does not move: the callee's frame is
/// pushed instead, and when it returns the statement runs again from its
/// start with the callee's result recorded. Statements are free of side
/// effects until all of their calls have results, so the replay repeats
/// nothing observable.
///
/// Stepping a finished or unstarted program starts it from the beginning.
///
/// # Errors
/// Any runtime error of the fired statement. The position is left at the
/// failing statement.
pub fn step(main: &mut Lts,
            functions: &mut IndexMap<String, Lts>,
            position: &mut Position)
            -> EvalResult<StepOutcome> {
    if position.finished || position.frames.is_empty() {
        *position = Position::start(main);
    }
    let Some(frame) = position.frames.last_mut() else {
        return Ok(StepOutcome::Finished { result: None });
    };

    let lts = match &frame.function {
        None => &*main,
        Some(name) => lookup(functions, name, 0)?,
    };
    trace!(function = ?frame.function, state = %frame.state, "step");

    let mut replay = ReplayCalls { results: &frame.call_results,
                                   next:    0,
                                   pending: None, };
    let fired = fire(lts, &frame.state, &mut frame.store, &mut replay);
    let pending = replay.pending.take();

    match fired {
        Err(RuntimeError::CallPending { name, line }) => {
            let arguments = pending.map(|(_, arguments)| arguments).unwrap_or_default();
            let callee = lookup(functions, &name, line)?;
            let store = callee.store().for_call(&name, arguments, line)?;
            debug!(function = %name, line, "enter call");
            position.frames.push(Frame { function: Some(name.clone()),
                                         state: callee.init_state().to_string(),
                                         store,
                                         call_results: Vec::new() });
            Ok(StepOutcome::EnteredCall { function: name })
        },
        Err(error) => Err(error),
        Ok(Fired::Moved(next)) => {
            frame.state.clone_from(&next);
            frame.call_results.clear();
            Ok(StepOutcome::Moved { state: next })
        },
        Ok(Fired::Returned { value, .. }) => finish_frame(main, functions, position, value),
        Ok(Fired::Halted) => finish_frame(main, functions, position, None),
    }
}

/// Pops the active frame and hands its result to the caller.
fn finish_frame(main: &mut Lts,
                functions: &mut IndexMap<String, Lts>,
                position: &mut Position,
                value: Option<Value>)
                -> EvalResult<StepOutcome> {
    let Some(frame) = position.frames.pop() else {
        return Ok(StepOutcome::Finished { result: value });
    };

    match frame.function {
        Some(name) => {
            let value = value.unwrap_or(Value::Undefined);
            if let Some(lts) = functions.get_mut(&name) {
                lts.set_store(frame.store);
            }
            if let Some(caller) = position.frames.last_mut() {
                caller.call_results.push(value.clone());
            }
            debug!(function = %name, "return");
            Ok(StepOutcome::Returned { function: name,
                                       value })
        },
        None => {
            main.set_store(frame.store);
            position.frames.clear();
            position.finished = true;
            position.result.clone_from(&value);
            debug!("main program finished");
            Ok(StepOutcome::Finished { result: value })
        },
    }
}

fn lookup<'f>(functions: &'f IndexMap<String, Lts>, name: &str, line: usize) -> EvalResult<&'f Lts> {
    functions.get(name)
             .ok_or_else(|| RuntimeError::UnknownFunction { name: name.to_string(),
                                                            line })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::core::compile;

    const SOURCE: &str = "\
○整数型: double(整数型: a)
    return a * 2
整数型: x ← double(3) + double(4)
";

    #[test]
    fn calls_suspend_and_replay_the_statement() {
        let compiled = compile(SOURCE).unwrap();
        let mut main = compiled.main;
        let mut functions = compiled.functions;
        let mut position = Position::default();

        let mut outcomes = Vec::new();
        loop {
            let outcome = step(&mut main, &mut functions, &mut position).unwrap();
            let done = matches!(outcome, StepOutcome::Finished { .. });
            outcomes.push(outcome);
            if done {
                break;
            }
        }

        assert_eq!(outcomes,
                   vec![StepOutcome::EnteredCall { function: "double".into() },
                        StepOutcome::Returned { function: "double".into(),
                                                value:    Value::Integer(6), },
                        StepOutcome::EnteredCall { function: "double".into() },
                        StepOutcome::Returned { function: "double".into(),
                                                value:    Value::Integer(8), },
                        StepOutcome::Moved { state: "S1".into() },
                        StepOutcome::Finished { result: None }]);
        assert_eq!(main.store().get("x"), Some(&Value::Integer(14)));
        assert_eq!(functions["double"].store().get("a"), Some(&Value::Integer(4)));
        assert!(position.finished);
    }

    #[test]
    fn call_stack_shows_active_frames() {
        let compiled = compile(SOURCE).unwrap();
        let mut main = compiled.main;
        let mut functions = compiled.functions;
        let mut position = Position::default();

        step(&mut main, &mut functions, &mut position).unwrap();
        assert_eq!(position.call_stack(), vec![(None, "S0"), (Some("double"), "S0")]);
        assert_eq!(position.active().unwrap().store.get("a"), Some(&Value::Integer(3)));
    }

    #[test]
    fn finished_programs_restart() {
        let compiled = compile("整数型: x ← 1\n").unwrap();
        let mut main = compiled.main;
        let mut functions = compiled.functions;
        let mut position = Position::default();

        assert!(matches!(step(&mut main, &mut functions, &mut position),
                         Ok(StepOutcome::Moved { .. })));
        assert!(matches!(step(&mut main, &mut functions, &mut position),
                         Ok(StepOutcome::Finished { .. })));
        assert_eq!(step(&mut main, &mut functions, &mut position),
                   Ok(StepOutcome::Moved { state: "S1".into() }));
        assert_eq!(position.frames.len(), 1);
    }
}
