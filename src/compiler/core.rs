use indexmap::IndexMap;
use tracing::debug;

use crate::{
    ast::{Action, Expr},
    compiler::source::{SourceLine, split_lines},
    error::{Error, LtsError, ParseError},
    interpreter::parser::statement::{Statement, parse_statement},
    lts::core::{Lts, StateType},
};

/// Result type used by the compiler.
///
/// Compilation fails with a `ParseError` for malformed source; an `LtsError`
/// would mean the compiler broke its own machine.
pub type CompileResult<T> = Result<T, Error>;

/// The machines compiled from one source text.
#[derive(Debug, Clone)]
pub struct Compiled {
    /// The top-level program.
    pub main:      Lts,
    /// Every function definition, in definition order.
    pub functions: IndexMap<String, Lts>,
}

/// Compiles source text into labeled transition systems.
///
/// Every statement becomes a transition labeled with its source text and
/// carrying its parsed form. Blocks become branching and looping topology.
/// Each machine ends in exactly one terminal state: explicit `return`s and
/// the fall-through end of the body all lead there.
///
/// # Errors
/// - Any grammar error of a statement.
/// - `IfBlock`, `WhileBlock`, `DoWhileBlock` or `ForBlock` for a block that
///   is not closed by its keyword.
/// - `Indentation` for a line deeper or shallower than its block allows,
///   unless the line is a closing keyword, which reports its block's error.
/// - `InvalidFunctionDeclaration` for nested or duplicate definitions.
/// - `InvalidFunctionCall` for a call of a function that is never defined.
///
/// # Example
/// ```
/// use gijigo::compiler::core::compile;
///
/// let compiled = compile("整数型: x ← 1\nx ← x + 1\n").unwrap();
/// assert_eq!(compiled.main.dead_ends().len(), 1);
/// assert!(compiled.functions.is_empty());
/// ```
pub fn compile(source: &str) -> CompileResult<Compiled> {
    let lines = split_lines(source)?;
    let mut compiler = Compiler { lines:     &lines,
                                  functions: IndexMap::new(), };

    let mut main = Machine::new(Lts::default(), true);
    let start = main.lts.init_state().to_string();
    let (ptr, open_end) = compiler.compile_block(&mut main, 0, 0, Some(start))?;
    if let Some(line) = lines.get(ptr) {
        return Err(stray(line)?.into());
    }

    let main = main.finish(open_end, lines.last().map_or(0, |line| line.number))?;
    debug!(states = main.states().count(), functions = compiler.functions.len(), "compiled main program");

    check_calls(&main, &compiler.functions)?;
    Ok(Compiled { main,
                  functions: compiler.functions })
}

/// Checks that every called function is defined.
///
/// Argument counts are checked when the call is made.
///
/// # Errors
/// `InvalidFunctionCall` for the earliest call of an unknown function.
pub fn check_calls(main: &Lts, functions: &IndexMap<String, Lts>) -> Result<(), ParseError> {
    let mut missing: Option<(String, usize)> = None;
    for lts in std::iter::once(main).chain(functions.values()) {
        for (_, state) in lts.states() {
            for action in state.transitions.iter().filter_map(|t| t.action.as_ref()) {
                action.for_each_call(&mut |name, _, line| {
                          if !functions.contains_key(name)
                             && missing.as_ref().is_none_or(|(_, first)| line < *first)
                          {
                              missing = Some((name.to_string(), line));
                          }
                      });
            }
        }
    }
    match missing {
        Some((name, line)) => Err(ParseError::InvalidFunctionCall { name, line }),
        None => Ok(()),
    }
}

/// Walks the source lines and collects function machines.
pub(super) struct Compiler<'s> {
    pub(super) lines:     &'s [SourceLine],
    pub(super) functions: IndexMap<String, Lts>,
}

impl<'s> Compiler<'s> {
    /// Compiles the run of statements at `indent` starting at `ptr`.
    ///
    /// `current` is the state the first statement leaves from; `None` means
    /// the previous statement returned and a fresh, unreachable state is
    /// opened on demand. The block stops at the first shallower line or at a
    /// closing keyword of its own indentation, which is left for the
    /// enclosing block to check.
    ///
    /// # Returns
    /// The index of the first line after the block and the state control
    /// leaves the block from, if it does not end in a `return`.
    pub(super) fn compile_block(&mut self,
                                machine: &mut Machine,
                                mut ptr: usize,
                                indent: usize,
                                mut current: Option<String>)
                                -> CompileResult<(usize, Option<String>)> {
        let lines = self.lines;
        while let Some(line) = lines.get(ptr) {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(stray(line)?.into());
            }

            match parse_statement(&line.text, line.number)? {
                Statement::ElseIf(_)
                | Statement::Else
                | Statement::EndIf
                | Statement::EndWhile
                | Statement::EndFor => break,
                Statement::Function(signature) => {
                    if !machine.is_main || indent > 0 {
                        return Err(ParseError::InvalidFunctionDeclaration {
                            details: "functions can only be defined at the top level".into(),
                            line:    line.number,
                        }.into());
                    }
                    ptr = self.compile_function(ptr, signature)?;
                },
                Statement::If(guard) => {
                    let entry = machine.open(current.take());
                    (ptr, current) = self.compile_if(machine, ptr, entry, guard)?;
                },
                Statement::While(guard) => {
                    let entry = machine.open(current.take());
                    (ptr, current) = self.compile_while(machine, ptr, entry, guard)?;
                },
                Statement::Do => {
                    let entry = machine.open(current.take());
                    (ptr, current) = self.compile_do_while(machine, ptr, entry)?;
                },
                Statement::For(guard) => {
                    let entry = machine.open(current.take());
                    (ptr, current) = self.compile_for(machine, ptr, entry, guard)?;
                },
                Statement::Simple(Action::Return(value)) => {
                    machine.push_return(current.take(), line, value)?;
                    ptr += 1;
                },
                Statement::Simple(action) => {
                    current = Some(machine.push_statement(current.take(), line, action)?);
                    ptr += 1;
                },
            }
        }
        Ok((ptr, current))
    }

    /// Compiles the body of a block header at `ptr`.
    ///
    /// The body is the block at the indentation of the next line if that is
    /// deeper than the header; otherwise the body is empty and control leaves
    /// it from `start` directly.
    pub(super) fn compile_body(&mut self,
                               machine: &mut Machine,
                               ptr: usize,
                               header: &SourceLine,
                               start: String)
                               -> CompileResult<(usize, Option<String>)> {
        let lines = self.lines;
        match lines.get(ptr + 1) {
            Some(next) if next.indent > header.indent => {
                self.compile_block(machine, ptr + 1, next.indent, Some(start))
            },
            _ => Ok((ptr + 1, Some(start))),
        }
    }

    /// Returns the line closing the block whose header is `header`.
    ///
    /// # Errors
    /// If the line after the body is deeper than the header, the error
    /// [`stray`] builds for it.
    pub(super) fn closing_line(&self,
                               ptr: usize,
                               header: &SourceLine)
                               -> Result<Option<&'s SourceLine>, ParseError> {
        let lines: &'s [SourceLine] = self.lines;
        match lines.get(ptr) {
            Some(line) if line.indent == header.indent => Ok(Some(line)),
            Some(line) if line.indent > header.indent => Err(stray(line)?),
            _ => Ok(None),
        }
    }
}

/// Builds the error for a line left over after a block: a closing keyword
/// that closes nothing, or a line between two indentation levels.
pub(super) fn stray(line: &SourceLine) -> Result<ParseError, ParseError> {
    let line_number = line.number;
    Ok(match parse_statement(&line.text, line_number)? {
           Statement::EndWhile => ParseError::WhileBlock { line: line_number },
           Statement::EndFor => ParseError::ForBlock { line: line_number },
           Statement::ElseIf(_) | Statement::Else | Statement::EndIf => {
               ParseError::IfBlock { line: line_number }
           },
           _ => ParseError::Indentation { line: line_number },
       })
}

/// A `return` whose edge still points at a placeholder state.
struct PendingReturn {
    source:      String,
    placeholder: String,
}

/// A machine under construction.
pub(super) struct Machine {
    pub(super) lts:     Lts,
    pub(super) is_main: bool,
    returns:            Vec<PendingReturn>,
}

impl Machine {
    pub(super) const fn new(lts: Lts, is_main: bool) -> Self {
        Self { lts,
               is_main,
               returns: Vec::new() }
    }

    /// Returns `current`, or a fresh state when the previous statement
    /// returned.
    pub(super) fn open(&mut self, current: Option<String>) -> String {
        current.unwrap_or_else(|| self.lts.create_state())
    }

    /// Emits a sequential statement and returns the state after it.
    fn push_statement(&mut self,
                      current: Option<String>,
                      line: &SourceLine,
                      action: Action)
                      -> CompileResult<String> {
        let kind = match action {
            Action::Declare(_) => StateType::Declare,
            Action::Assign(_) | Action::Append(_) => StateType::Assign,
            _ => StateType::Formula,
        };
        let source = self.open(current);
        let target = self.lts.create_state();
        self.lts.set_state_type(&source, kind)?;
        self.lts.add_transition(&source, &line.text, &target, line.number, Some(action))?;
        Ok(target)
    }

    /// Emits a `return` towards a placeholder that `finish` replaces with the
    /// shared terminal.
    fn push_return(&mut self,
                   current: Option<String>,
                   line: &SourceLine,
                   value: Option<Expr>)
                   -> CompileResult<()> {
        let source = self.open(current);
        let placeholder = self.lts.create_state();
        self.lts.set_state_type(&source, StateType::Return)?;
        self.lts.add_transition(&source,
                                &line.text,
                                &placeholder,
                                line.number,
                                Some(Action::Return(value)))?;
        self.returns.push(PendingReturn { source, placeholder });
        Ok(())
    }

    /// Unifies every exit into one terminal state and returns the machine.
    ///
    /// Explicit returns are redirected from their placeholders to the
    /// terminal. The fall-through end of the body, if any, becomes an
    /// implicit `return` labeled `return`.
    pub(super) fn finish(mut self, open_end: Option<String>, last_line: usize) -> CompileResult<Lts> {
        let terminal = self.lts.create_state();

        for PendingReturn { source, placeholder } in std::mem::take(&mut self.returns) {
            let transition = self.lts
                                 .transition(&source, 0)?
                                 .cloned()
                                 .ok_or_else(|| LtsError::UnknownTransition {
                                     state: source.clone(),
                                     label: String::new(),
                                 })?;
            self.lts.clear_transitions(&source)?;
            self.lts.remove_state(&placeholder)?;
            self.lts.add_transition(&source,
                                    &transition.label,
                                    &terminal,
                                    transition.line,
                                    transition.action)?;
        }

        if let Some(end) = open_end {
            self.lts.set_state_type(&end, StateType::Return)?;
            self.lts.add_transition(&end, "return", &terminal, last_line, Some(Action::Return(None)))?;
        }

        Ok(self.lts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_err(source: &str) -> ParseError {
        match compile(source) {
            Err(Error::Parse(error)) => error,
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn sequential_statements_chain() {
        let compiled = compile("整数型: x ← 1\nx ← x + 1\nx の末尾に 1 を追加する").unwrap();
        let main = &compiled.main;
        assert_eq!(main.state_type("S0"), Ok(StateType::Declare));
        assert_eq!(main.transition_target("S0", "整数型: x ← 1"), Ok("S1"));
        assert_eq!(main.state_type("S1"), Ok(StateType::Assign));
        assert_eq!(main.state_type("S2"), Ok(StateType::Assign));
        assert_eq!(main.state_type("S3"), Ok(StateType::Return));
        assert_eq!(main.transition_target("S3", "return"), Ok("S4"));
        assert_eq!(main.dead_ends(), vec!["S4"]);
    }

    #[test]
    fn if_chain_merges_once_with_synthesized_else() {
        let source = "\
整数型: x ← 2, y
if (x = 1)
    y ← 10
elseif (x = 2)
    y ← 20
endif
y ← y + 1";
        let main = compile(source).unwrap().main;
        let entry = "S1";
        assert_eq!(main.state_type(entry), Ok(StateType::If));

        let labels: Vec<_> =
            main.state(entry).unwrap().transitions.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["x = 1", "x = 2", "else"]);

        let merges: Vec<_> = main.states()
                                 .filter(|(name, _)| main.backwards(name).any(|(l, _)| l == "endif"))
                                 .map(|(name, _)| name.to_string())
                                 .collect();
        assert_eq!(merges.len(), 1);
        assert_eq!(main.backwards(&merges[0]).count(), 3);
    }

    #[test]
    fn while_loops_back_to_entry() {
        let main = compile("整数型: i ← 0\nwhile (i < 3)\n    i ← i + 1\nendwhile").unwrap().main;
        assert_eq!(main.state_type("S1"), Ok(StateType::While));
        let body = main.transition_target("S1", "i < 3").unwrap().to_string();
        let end = main.transition_target(&body, "i ← i + 1").unwrap();
        assert_eq!(main.transition_target(end, ""), Ok("S1"));
        assert!(main.transition_target("S1", "endwhile").is_ok());
    }

    #[test]
    fn misspelled_endwhile_names_its_line() {
        let source = "整数型: i ← 0\nwhile (i < 3)\n    i ← i + 1\nendwhil\n";
        assert_eq!(compile_err(source), ParseError::WhileBlock { line: 4 });
    }

    #[test]
    fn unclosed_blocks_name_their_header() {
        assert_eq!(compile_err("x ← 1\nif (x = 1)\n    x ← 2\n"), ParseError::IfBlock { line: 2 });
        assert_eq!(compile_err("x ← 1\ndo\n    x ← 2\n"), ParseError::DoWhileBlock { line: 2 });
        assert_eq!(compile_err("for (i を 1 から 3 まで)\n    x ← i\n"),
                   ParseError::ForBlock { line: 1 });
        assert_eq!(compile_err("x ← 1\nendif\n"), ParseError::IfBlock { line: 2 });
    }

    #[test]
    fn indentation_must_match() {
        assert_eq!(compile_err("x ← 1\n  y ← 2\n"), ParseError::Indentation { line: 2 });
        assert_eq!(compile_err("x ← 1\nif (x = 1)\n    x ← 2\n  y ← 3\n"),
                   ParseError::Indentation { line: 4 });
        assert_eq!(compile_err("if (true)\n    x ← 2\n      y ← 1\nendif\n"),
                   ParseError::Indentation { line: 3 });
    }

    #[test]
    fn misplaced_terminators_name_their_block() {
        let source = "整数型: i ← 0\nif (true)\n    while (i < 3)\n        i ← i + 1\n      endwhile\nendif\n";
        assert_eq!(compile_err(source), ParseError::WhileBlock { line: 5 });
        assert_eq!(compile_err("x ← 1\nif (x = 1)\n    x ← 2\n  endif\n"),
                   ParseError::IfBlock { line: 4 });
        assert_eq!(compile_err("for (i を 1 から 3 まで)\n    x ← i\n        endfor\nendfor\n"),
                   ParseError::ForBlock { line: 3 });
    }

    #[test]
    fn calls_must_name_defined_functions() {
        assert_eq!(compile_err("x ← 1\ny ← g(x)\n"),
                   ParseError::InvalidFunctionCall { name: "g".into(),
                                                     line: 2, });
    }
}
