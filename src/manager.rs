use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::{
    engine::step::StepOutcome,
    error::Error,
    interpreter::value::core::Value,
    program::Program,
};

/// Where the manager keeps its program record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// The record written by save and read by restore when no path is given.
    pub record_path: PathBuf,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self { record_path: PathBuf::from("execution_info.json") }
    }
}

/// Drives a program from the command line: compiling, stepping, saving and
/// restoring, and showing where execution stands.
#[derive(Debug, Default)]
pub struct Manager {
    config:  ManagerConfig,
    program: Option<Program>,
}

impl Manager {
    #[must_use]
    pub const fn new(config: ManagerConfig) -> Self {
        Self { config,
               program: None }
    }

    #[must_use]
    pub const fn config(&self) -> &ManagerConfig {
        &self.config
    }

    #[must_use]
    pub const fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// Reads and compiles a source file, replacing the current program.
    ///
    /// # Errors
    /// `Io` when the file cannot be read, or any compile error.
    pub fn compile_file(&mut self, path: &Path) -> Result<&Program, Error> {
        let source = fs::read_to_string(path)?;
        let program = Program::compile(&source)?;
        info!(path = %path.display(), "compiled source file");
        Ok(&*self.program.insert(program))
    }

    /// Writes the program record to `path`, or to the configured record.
    ///
    /// # Errors
    /// `NoProgram`, or any encoding or I/O error.
    pub fn save(&self, path: Option<&Path>) -> Result<(), Error> {
        let path = path.unwrap_or(&self.config.record_path);
        let json = self.loaded()?.to_json()?;
        fs::write(path, json)?;
        info!(path = %path.display(), "saved program record");
        Ok(())
    }

    /// Replaces the program with the record at `path`, or at the configured
    /// record.
    ///
    /// # Errors
    /// `Io` when the file cannot be read, or any error of
    /// [`Program::from_json`].
    pub fn restore(&mut self, path: Option<&Path>) -> Result<&Program, Error> {
        let path = path.unwrap_or(&self.config.record_path);
        let json = fs::read_to_string(path)?;
        let program = Program::from_json(&json)?;
        info!(path = %path.display(), "restored program record");
        Ok(&*self.program.insert(program))
    }

    /// Advances the program by one statement.
    ///
    /// # Errors
    /// `NoProgram`, or the runtime error of the statement.
    pub fn next(&mut self) -> Result<StepOutcome, Error> {
        let program = self.program.as_mut().ok_or(Error::NoProgram)?;
        Ok(program.step()?)
    }

    /// Runs the program to completion.
    ///
    /// A program that is part way through continues where it stands.
    ///
    /// # Errors
    /// `NoProgram`, or the first runtime error.
    pub fn run_all(&mut self) -> Result<Option<Value>, Error> {
        let program = self.program.as_mut().ok_or(Error::NoProgram)?;
        Ok(program.resume()?)
    }

    /// Writes the call stack and the active function and state.
    ///
    /// # Errors
    /// Fails only when writing to `out` fails.
    pub fn show_current(&self, out: &mut impl Write) -> io::Result<()> {
        let frames = self.program
                         .as_ref()
                         .and_then(Program::position)
                         .filter(|position| !position.frames.is_empty())
                         .map(|position| position.call_stack());
        let Some(frames) = frames else {
            return writeln!(out, "Not running.");
        };

        let stack = frames.iter()
                          .map(|(function, state)| format!("{}:{state}", function.unwrap_or("main")))
                          .collect::<Vec<_>>()
                          .join(" -> ");
        writeln!(out, "Call stack: {stack}")?;
        if let Some((function, state)) = frames.last() {
            writeln!(out, "Function: {}", function.unwrap_or("main"))?;
            writeln!(out, "State: {state}")?;
        }
        Ok(())
    }

    /// Writes the machine and the bindings of one function. The name `main`
    /// selects the top-level program unless a function has that name.
    ///
    /// # Errors
    /// Fails only when writing to `out` fails.
    pub fn show_function(&self, name: &str, out: &mut impl Write) -> io::Result<()> {
        let Some(program) = &self.program else {
            return writeln!(out, "{}", Error::NoProgram);
        };
        let (lts, bindings) = match program.function(name) {
            Some(lts) => (lts, program.bindings(Some(name))),
            None if name == "main" => (program.main(), program.bindings(None)),
            None => return writeln!(out, "There is no function named '{name}'."),
        };

        writeln!(out, "LTS:")?;
        write!(out, "{lts}")?;
        writeln!(out, "Bindings:")?;
        if let Some(bindings) = bindings {
            write!(out, "{bindings}")?;
        }
        Ok(())
    }

    /// Runs the interactive menu until `E` or the end of input.
    ///
    /// Errors of individual commands are reported on `out` and the loop
    /// continues.
    ///
    /// # Errors
    /// Fails only when reading `input` or writing `out` fails.
    pub fn interactive(&mut self, input: &mut impl BufRead, out: &mut impl Write) -> io::Result<()> {
        loop {
            writeln!(out,
                     "Enter a command: F: compile a file / C: show the current state / S: save the \
                      state / R: restore a saved state / N: next statement / A: run to the end / \
                      E: exit")?;
            let Some(command) = read_line(input)? else {
                return Ok(());
            };

            match command.to_ascii_uppercase().as_str() {
                "F" => {
                    writeln!(out, "Enter the source file path.")?;
                    let Some(path) = read_line(input)? else {
                        return Ok(());
                    };
                    match self.compile_file(Path::new(&path)) {
                        Ok(program) => {
                            writeln!(out, "Compiled {} function(s).", program.function_names().count())?;
                        },
                        Err(error) => report(out, &error)?,
                    }
                },
                "C" => {
                    self.show_current(out)?;
                    writeln!(out, "D: details / E: back")?;
                    let Some(choice) = read_line(input)? else {
                        return Ok(());
                    };
                    if choice.eq_ignore_ascii_case("D") {
                        self.browse_functions(input, out)?;
                    }
                },
                "S" => {
                    let Some(path) = self.ask_record_path(input, out)? else {
                        return Ok(());
                    };
                    if let Err(error) = self.save(Some(&path)) {
                        report(out, &error)?;
                    }
                },
                "R" => {
                    let Some(path) = self.ask_record_path(input, out)? else {
                        return Ok(());
                    };
                    if let Err(error) = self.restore(Some(&path)) {
                        report(out, &error)?;
                    }
                },
                "N" => {
                    match self.next() {
                        Ok(outcome) => writeln!(out, "{}", describe(&outcome))?,
                        Err(error) => report(out, &error)?,
                    }
                    if self.program.is_some()
                       && let Err(error) = self.save(None)
                    {
                        report(out, &error)?;
                    }
                },
                "A" => match self.run_all() {
                    Ok(result) => {
                        writeln!(out, "Finished. Result: {}", describe_result(result.as_ref()))?;
                        if let Some(bindings) = self.program.as_ref().and_then(|p| p.bindings(None)) {
                            write!(out, "{bindings}")?;
                        }
                    },
                    Err(error) => report(out, &error)?,
                },
                "E" => return Ok(()),
                _ => writeln!(out, "Unknown command '{command}'.")?,
            }
        }
    }

    fn browse_functions(&self, input: &mut impl BufRead, out: &mut impl Write) -> io::Result<()> {
        let names = self.program
                        .as_ref()
                        .map(|program| program.function_names().collect::<Vec<_>>().join(", "))
                        .unwrap_or_default();
        writeln!(out, "Functions: [{names}]")?;

        loop {
            writeln!(out, "Enter a function to show (E to stop):")?;
            match read_line(input)? {
                Some(name) if name != "E" => self.show_function(&name, out)?,
                _ => return Ok(()),
            }
        }
    }

    fn ask_record_path(&self,
                       input: &mut impl BufRead,
                       out: &mut impl Write)
                       -> io::Result<Option<PathBuf>> {
        writeln!(out,
                 "Enter the record path (empty for {}).",
                 self.config.record_path.display())?;
        Ok(read_line(input)?.map(|path| {
                                 if path.is_empty() {
                                     self.config.record_path.clone()
                                 } else {
                                     PathBuf::from(path)
                                 }
                             }))
    }

    fn loaded(&self) -> Result<&Program, Error> {
        self.program.as_ref().ok_or(Error::NoProgram)
    }
}

/// Renders a step for the user.
#[must_use]
pub fn describe(outcome: &StepOutcome) -> String {
    match outcome {
        StepOutcome::Moved { state } => format!("Moved to {state}."),
        StepOutcome::EnteredCall { function } => format!("Entered {function}."),
        StepOutcome::Returned { function, value } => format!("{function} returned {value}."),
        StepOutcome::Finished { result } => {
            format!("Finished. Result: {}", describe_result(result.as_ref()))
        },
    }
}

fn describe_result(result: Option<&Value>) -> String {
    result.map_or_else(|| "none".to_string(), ToString::to_string)
}

fn report(out: &mut impl Write, error: &Error) -> io::Result<()> {
    warn!(%error, "command failed");
    writeln!(out, "{error}")
}

fn read_line(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn session(manager: &mut Manager, script: &str) -> String {
        let mut out = Vec::new();
        manager.interactive(&mut Cursor::new(script.as_bytes()), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn commands_without_a_program_report_it() {
        let mut manager = Manager::default();
        let out = session(&mut manager, "A\nC\nE\nX\nE\n");
        assert!(out.contains("No program is loaded."));
        assert!(out.contains("Not running."));
        assert!(out.contains("Unknown command 'X'."));
    }

    #[test]
    fn step_save_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        fs::write(&source, "整数型: x ← 1\nx ← x + 1\n").unwrap();
        let record = dir.path().join("execution_info.json");

        let mut manager = Manager::new(ManagerConfig { record_path: record.clone() });
        let script = format!("F\n{}\nN\nC\nE\n", source.display());
        let out = session(&mut manager, &script);
        assert!(out.contains("Moved to S1."));
        assert!(out.contains("Call stack: main:S1"));
        assert!(record.exists());

        let mut restored = Manager::new(ManagerConfig { record_path: record });
        let out = session(&mut restored, "R\n\nA\n");
        assert!(out.contains("Finished. Result: none"));
        assert!(out.contains("x: 整数型 = 2"));
    }

    #[test]
    fn details_show_function_machines() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        fs::write(&source, "○整数型: one()\n    return 1\n整数型: x ← one()\n").unwrap();

        let mut manager = Manager::default();
        manager.compile_file(&source).unwrap();
        let out = session(&mut manager, "C\nD\none\nnope\nE\nE\n");
        assert!(out.contains("Functions: [one]"));
        assert!(out.contains("return 1 -> "));
        assert!(out.contains("There is no function named 'nope'."));
    }
}
