use tracing::debug;

use crate::{
    ast::FunctionSignature,
    compiler::core::{CompileResult, Compiler, Machine, stray},
    error::ParseError,
    lts::{core::Lts, store::VariableStore},
};

impl Compiler<'_> {
    /// Compiles the function defined by the header at `ptr` into its own
    /// machine and registers it.
    ///
    /// The body is every following line indented deeper than the header.
    /// Parameters start out declared with their types and bound to `未定義`.
    ///
    /// # Returns
    /// The index of the first line after the body.
    ///
    /// # Errors
    /// `InvalidFunctionDeclaration` for a name that is already defined, and
    /// any error of the body.
    pub(super) fn compile_function(&mut self,
                                   ptr: usize,
                                   signature: FunctionSignature)
                                   -> CompileResult<usize> {
        let lines = self.lines;
        let header = &lines[ptr];
        if self.functions.contains_key(&signature.name) {
            return Err(ParseError::InvalidFunctionDeclaration {
                details: format!("'{}' is already defined", signature.name),
                line:    header.number,
            }.into());
        }

        let mut lts = Lts::default();
        lts.set_store(VariableStore::with_params(&signature.params));
        lts.set_returns(signature.return_type);

        let mut machine = Machine::new(lts, false);
        let start = machine.lts.init_state().to_string();
        let (next, open_end) = self.compile_body(&mut machine, ptr, header, start)?;
        if let Some(line) = lines.get(next)
           && line.indent > header.indent
        {
            return Err(stray(line)?.into());
        }

        let lts = machine.finish(open_end, lines[next - 1].number)?;
        debug!(function = %signature.name,
               params = signature.params.len(),
               states = lts.states().count(),
               "compiled function");
        self.functions.insert(signature.name, lts);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        compiler::core::compile,
        error::{Error, ParseError},
        interpreter::value::core::Value,
        lts::core::StateType,
    };

    const FACTORIAL: &str = "\
○整数型: fact(整数型: n)
    if (n ≦ 1)
        return 1
    endif
    return n * fact(n - 1)
整数型: x ← fact(5)
";

    #[test]
    fn functions_compile_into_their_own_machine() {
        let compiled = compile(FACTORIAL).unwrap();
        let fact = &compiled.functions["fact"];
        assert_eq!(fact.store().params(), ["n"]);
        assert_eq!(fact.store().get("n"), Some(&Value::Undefined));
        assert_eq!(fact.returns().map(|t| t.to_string()), Some("整数型".into()));
        assert_eq!(compiled.main.state_type("S0"), Ok(StateType::Declare));
    }

    #[test]
    fn every_exit_reaches_one_terminal() {
        let compiled = compile(FACTORIAL).unwrap();
        let fact = &compiled.functions["fact"];
        let terminals = fact.dead_ends();
        assert_eq!(terminals.len(), 1);

        let sources: Vec<_> = fact.backwards(terminals[0]).map(|(label, _)| label).collect();
        assert_eq!(sources.len(), 2);
        assert!(sources.contains(&"return 1"));
        assert!(sources.contains(&"return n * fact(n - 1)"));
    }

    #[test]
    fn implicit_return_closes_open_end() {
        let compiled = compile("○f(整数型: a)\n    a ← a + 1\nf(1)\n").unwrap();
        let f = &compiled.functions["f"];
        let terminal = f.dead_ends()[0].to_string();
        let exits: Vec<_> = f.backwards(&terminal).collect();
        assert_eq!(exits.len(), 1);
        assert_eq!(exits[0].0, "return");
        assert_eq!(f.state_type(exits[0].1), Ok(StateType::Return));
    }

    #[test]
    fn definitions_must_be_top_level_and_unique() {
        let nested = "if (true)\n    ○f()\n        return 1\nendif\n";
        assert!(matches!(compile(nested),
                         Err(Error::Parse(ParseError::InvalidFunctionDeclaration { line: 2, .. }))));
        let twice = "○f()\n    return 1\n○f()\n    return 2\n";
        assert!(matches!(compile(twice),
                         Err(Error::Parse(ParseError::InvalidFunctionDeclaration { line: 3, .. }))));
    }
}
