use crate::{
    ast::Action,
    compiler::{
        core::{CompileResult, Compiler, Machine},
        source::SourceLine,
    },
    error::ParseError,
    interpreter::parser::statement::{Guard, Statement, parse_statement},
    lts::core::StateType,
};

impl<'s> Compiler<'s> {
    /// Compiles an `if` chain whose header is at `ptr`.
    ///
    /// The entry state gets one guarded transition per `if`/`elseif` and an
    /// `else` transition last, synthesized with an empty branch when the
    /// source has none. Every branch that does not return is joined by an
    /// `endif` transition into a single merge state.
    pub(super) fn compile_if(&mut self,
                             machine: &mut Machine,
                             ptr: usize,
                             entry: String,
                             guard: Guard)
                             -> CompileResult<(usize, Option<String>)> {
        let lines = self.lines;
        let header = &lines[ptr];
        machine.lts.set_state_type(&entry, StateType::If)?;

        let mut open_ends = Vec::new();
        let mut branch_header = header;
        let mut branch = Some(guard);
        let mut has_else = false;
        let mut ptr = ptr;

        let endif = loop {
            let (label, action) = match branch.take() {
                Some(Guard { label, action }) => (label, action),
                None => ("else".to_string(), Action::Pass),
            };
            let start = machine.lts.create_state();
            machine.lts.add_transition(&entry, &label, &start, branch_header.number, Some(action))?;

            let (next, end) = self.compile_body(machine, ptr, branch_header, start)?;
            open_ends.extend(end);
            ptr = next;

            let Some(line) = self.closing_line(ptr, header)? else {
                return Err(unclosed_if(lines.get(ptr).unwrap_or(header).number).into());
            };
            match parse_statement(&line.text, line.number)? {
                Statement::ElseIf(guard) if !has_else => branch = Some(guard),
                Statement::Else if !has_else => has_else = true,
                Statement::EndIf => break line,
                _ => return Err(unclosed_if(line.number).into()),
            }
            branch_header = line;
        };

        if !has_else {
            let empty = machine.lts.create_state();
            machine.lts.add_transition(&entry, "else", &empty, header.number, Some(Action::Pass))?;
            open_ends.push(empty);
        }

        if open_ends.is_empty() {
            return Ok((ptr + 1, None));
        }
        let merge = machine.lts.create_state();
        for end in open_ends {
            machine.lts.add_transition(&end, "endif", &merge, endif.number, Some(Action::Pass))?;
        }
        Ok((ptr + 1, Some(merge)))
    }

    /// Compiles a `while` loop whose header is at `ptr`.
    ///
    /// The entry state is typed `While`: its guard leads into the body, the
    /// end of the body leads back to the entry over an empty label, and the
    /// `endwhile` transition leaves the loop.
    pub(super) fn compile_while(&mut self,
                                machine: &mut Machine,
                                ptr: usize,
                                entry: String,
                                guard: Guard)
                                -> CompileResult<(usize, Option<String>)> {
        let lines = self.lines;
        let header = &lines[ptr];
        let (ptr, close) = self.compile_loop(machine, ptr, &entry, StateType::While, guard)?;

        let closed = match close {
            Some(line) => match parse_statement(&line.text, line.number)? {
                Statement::EndWhile => line,
                _ => return Err(ParseError::WhileBlock { line: line.number }.into()),
            },
            None => {
                let line = lines.get(ptr).unwrap_or(header).number;
                return Err(ParseError::WhileBlock { line }.into());
            },
        };

        let post = machine.lts.create_state();
        machine.lts.add_transition(&entry, "endwhile", &post, closed.number, Some(Action::Pass))?;
        Ok((ptr + 1, Some(post)))
    }

    /// Compiles a counted `for` loop whose header is at `ptr`.
    ///
    /// Shaped like `while`, with the header as the guard label and `endfor`
    /// as the exit. The engine interprets the header on every visit.
    pub(super) fn compile_for(&mut self,
                              machine: &mut Machine,
                              ptr: usize,
                              entry: String,
                              guard: Guard)
                              -> CompileResult<(usize, Option<String>)> {
        let lines = self.lines;
        let header = &lines[ptr];
        let (ptr, close) = self.compile_loop(machine, ptr, &entry, StateType::For, guard)?;

        let closed = match close {
            Some(line) => match parse_statement(&line.text, line.number)? {
                Statement::EndFor => line,
                _ => return Err(ParseError::ForBlock { line: line.number }.into()),
            },
            None => {
                let line = lines.get(ptr).unwrap_or(header).number;
                return Err(ParseError::ForBlock { line }.into());
            },
        };

        let post = machine.lts.create_state();
        machine.lts.add_transition(&entry, "endfor", &post, closed.number, Some(Action::Pass))?;
        Ok((ptr + 1, Some(post)))
    }

    /// Compiles a `do` block whose header is at `ptr`, closed by a
    /// `while (condition)` line at the same indentation.
    ///
    /// The body is entered unconditionally over a `do` transition. Its end is
    /// typed `While`: the condition leads back to the start of the body and
    /// `else` leaves the loop.
    pub(super) fn compile_do_while(&mut self,
                                   machine: &mut Machine,
                                   ptr: usize,
                                   entry: String)
                                   -> CompileResult<(usize, Option<String>)> {
        let lines = self.lines;
        let header = &lines[ptr];
        let start = machine.lts.create_state();
        machine.lts.add_transition(&entry, "do", &start, header.number, Some(Action::Pass))?;

        let (ptr, end) = self.compile_body(machine, ptr, header, start.clone())?;
        let Some(line) = self.closing_line(ptr, header)? else {
            let line = lines.get(ptr).unwrap_or(header).number;
            return Err(ParseError::DoWhileBlock { line }.into());
        };
        let Statement::While(Guard { label, action }) = parse_statement(&line.text, line.number)?
        else {
            return Err(ParseError::DoWhileBlock { line: line.number }.into());
        };

        let tail = machine.open(end);
        let post = machine.lts.create_state();
        machine.lts.set_state_type(&tail, StateType::While)?;
        machine.lts.add_transition(&tail, &label, &start, line.number, Some(action))?;
        machine.lts.add_transition(&tail, "else", &post, line.number, Some(Action::Pass))?;
        Ok((ptr + 1, Some(post)))
    }

    /// Emits the common shape of `while` and `for`: the typed entry, the
    /// guarded body and the back edge.
    ///
    /// # Returns
    /// The index of the line after the body and that line, when it sits at
    /// the header's indentation.
    fn compile_loop(&mut self,
                    machine: &mut Machine,
                    ptr: usize,
                    entry: &str,
                    kind: StateType,
                    guard: Guard)
                    -> CompileResult<(usize, Option<&'s SourceLine>)> {
        let lines = self.lines;
        let header = &lines[ptr];
        machine.lts.set_state_type(entry, kind)?;

        let body = machine.lts.create_state();
        machine.lts.add_transition(entry, &guard.label, &body, header.number, Some(guard.action))?;

        let (ptr, end) = self.compile_body(machine, ptr, header, body)?;
        if let Some(end) = end {
            machine.lts.add_transition(&end, "", entry, header.number, Some(Action::Pass))?;
        }
        Ok((ptr, self.closing_line(ptr, header)?))
    }
}

fn unclosed_if(line: usize) -> ParseError {
    ParseError::IfBlock { line }
}
