use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    compiler::{
        core::{CompileResult, check_calls, compile},
        link::link,
    },
    engine::{
        core::{DirectCalls, run},
        step::{Position, StepOutcome, step},
    },
    error::{Error, LtsError},
    interpreter::{evaluator::core::EvalResult, value::core::Value},
    lts::{core::Lts, store::VariableStore},
};

/// A compiled program together with its execution position.
///
/// The program owns one machine for the top level and one per function.
/// Two programs never share state.
///
/// # Example
/// ```
/// use gijigo::{interpreter::value::core::Value, program::Program};
///
/// let mut program = Program::compile("整数型: x ← 6 * 7\n").unwrap();
/// program.run().unwrap();
/// assert_eq!(program.main().store().get("x"), Some(&Value::Integer(42)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    main:      Lts,
    #[serde(default)]
    functions: IndexMap<String, Lts>,
    #[serde(default)]
    position:  Option<Position>,
}

impl Program {
    /// Compiles source text into a program that has not started.
    ///
    /// # Errors
    /// Any compile error; see [`compile`].
    pub fn compile(source: &str) -> CompileResult<Self> {
        let compiled = compile(source)?;
        Ok(Self { main:      compiled.main,
                  functions: compiled.functions,
                  position:  None, })
    }

    /// The names of all functions in definition order.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    #[must_use]
    pub fn function(&self, name: &str) -> Option<&Lts> {
        self.functions.get(name)
    }

    #[must_use]
    pub const fn main(&self) -> &Lts {
        &self.main
    }

    /// The bindings to show for a function, or for the main program when
    /// `function` is `None`.
    ///
    /// While the program is stepping, the innermost active frame of that
    /// function wins; otherwise the machine's last recorded store is shown.
    #[must_use]
    pub fn bindings(&self, function: Option<&str>) -> Option<&VariableStore> {
        let active = self.position
                         .iter()
                         .flat_map(|position| position.frames.iter().rev())
                         .find(|frame| frame.function.as_deref() == function);
        if let Some(frame) = active {
            return Some(&frame.store);
        }

        match function {
            None => Some(self.main.store()),
            Some(name) => self.functions.get(name).map(Lts::store),
        }
    }

    #[must_use]
    pub const fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Replaces the execution position.
    ///
    /// # Errors
    /// `UnknownState` when a frame names a function or state the program
    /// does not have.
    pub fn set_position(&mut self, position: Option<Position>) -> Result<(), LtsError> {
        if let Some(position) = &position {
            self.check_position(position)?;
        }
        self.position = position;
        Ok(())
    }

    /// Whether the main program has returned in stepping mode.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.position.as_ref().is_some_and(|position| position.finished)
    }

    /// Drops the execution position; the next step starts over.
    pub fn reset(&mut self) {
        self.position = None;
    }

    /// Runs the program from the start with every call completing at once.
    ///
    /// The final bindings are left in the main machine's store and in the
    /// store of each function's last finished call. The execution position
    /// is cleared.
    ///
    /// # Errors
    /// The first runtime error.
    pub fn run(&mut self) -> EvalResult<Option<Value>> {
        let mut store = VariableStore::new();
        let mut calls = DirectCalls::new(&self.functions);
        let result = run(&self.main, &mut store, &mut calls);
        let finished = calls.into_finished();

        for (name, store) in finished {
            if let Some(lts) = self.functions.get_mut(&name) {
                lts.set_store(store);
            }
        }
        self.main.set_store(store);
        self.position = None;
        debug!(result = ?result, "run finished");
        result
    }

    /// Fires one transition; see [`step`].
    ///
    /// # Errors
    /// The runtime error of the fired statement.
    pub fn step(&mut self) -> EvalResult<StepOutcome> {
        let position = self.position.get_or_insert_with(|| Position::start(&self.main));
        step(&mut self.main, &mut self.functions, position)
    }

    /// Steps until the main program returns and yields its result.
    ///
    /// A finished program is started again.
    ///
    /// # Errors
    /// The first runtime error.
    pub fn resume(&mut self) -> EvalResult<Option<Value>> {
        if self.is_finished() {
            self.reset();
        }
        loop {
            if let StepOutcome::Finished { result } = self.step()? {
                return Ok(result);
            }
        }
    }

    /// Encodes the whole program as a plain JSON record.
    ///
    /// # Errors
    /// `Record` if a value cannot be encoded.
    pub fn to_record(&self) -> Result<serde_json::Value, Error> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuilds a program from a record written by [`Program::to_record`].
    ///
    /// Every transition label is parsed again, so a record is only accepted
    /// if it describes a well-formed program.
    ///
    /// # Errors
    /// - `Record` for JSON that does not describe a program.
    /// - Any parse error of a label.
    /// - `Lts` errors for dangling transitions or positions.
    pub fn from_record(record: serde_json::Value) -> Result<Self, Error> {
        let mut program: Self = serde_json::from_value(record)?;
        program.relink()?;
        Ok(program)
    }

    /// # Errors
    /// `Record` if a value cannot be encoded.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// # Errors
    /// See [`Program::from_record`].
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let mut program: Self = serde_json::from_str(json)?;
        program.relink()?;
        info!(functions = program.functions.len(), "program record loaded");
        Ok(program)
    }

    fn relink(&mut self) -> Result<(), Error> {
        link(&mut self.main)?;
        for lts in self.functions.values_mut() {
            link(lts)?;
        }
        check_calls(&self.main, &self.functions)?;
        if let Some(position) = &self.position {
            self.check_position(position)?;
        }
        Ok(())
    }

    fn check_position(&self, position: &Position) -> Result<(), LtsError> {
        for frame in &position.frames {
            let lts = match &frame.function {
                None => &self.main,
                Some(name) => {
                    self.functions
                        .get(name)
                        .ok_or_else(|| LtsError::UnknownState { state: format!("{name}:{}", frame.state) })?
                },
            };
            lts.state(&frame.state)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
○整数型: square(整数型: n)
    return n * n
整数型: total ← 0
for (i を 1 から 3 まで 1 ずつ増やす)
    total ← total + square(i)
endfor
return total
";

    #[test]
    fn run_and_resume_agree() {
        let mut direct = Program::compile(SOURCE).unwrap();
        let mut stepped = direct.clone();

        assert_eq!(direct.run(), Ok(Some(Value::Integer(14))));
        assert_eq!(stepped.resume(), Ok(Some(Value::Integer(14))));
        assert_eq!(direct.main().store(), stepped.main().store());
        assert!(stepped.is_finished());
        assert!(!direct.is_finished());
    }

    #[test]
    fn bindings_follow_the_active_frame() {
        let mut program = Program::compile(SOURCE).unwrap();
        while !matches!(program.step(), Ok(StepOutcome::EnteredCall { .. })) {}

        let n = program.bindings(Some("square")).and_then(|store| store.get("n"));
        assert_eq!(n, Some(&Value::Integer(1)));
        let i = program.bindings(None).and_then(|store| store.get("i"));
        assert_eq!(i, Some(&Value::Integer(1)));
    }

    #[test]
    fn records_round_trip_mid_run() {
        let mut program = Program::compile(SOURCE).unwrap();
        for _ in 0..4 {
            program.step().unwrap();
        }

        let mut restored = Program::from_json(&program.to_json().unwrap()).unwrap();
        assert_eq!(restored, program);
        assert_eq!(restored.resume(), program.resume());
        assert_eq!(restored.main().store(), program.main().store());
    }

    #[test]
    fn positions_must_name_real_states() {
        let mut program = Program::compile(SOURCE).unwrap();
        let mut position = Position::start(program.main());
        position.frames[0].state = "S99".into();

        assert_eq!(program.set_position(Some(position)),
                   Err(LtsError::UnknownState { state: "S99".into() }));
        assert!(program.position().is_none());
    }

    #[test]
    fn broken_labels_are_rejected_on_load() {
        let program = Program::compile("整数型: x ← 1\n").unwrap();
        let json = program.to_json().unwrap().replace("整数型: x ← 1", "整数型: x ← (1");
        assert!(matches!(Program::from_json(&json), Err(Error::Parse(_))));
    }
}
