use crate::{
    ast::Action,
    compiler::core::CompileResult,
    error::ParseError,
    interpreter::parser::{
        core::ParseResult,
        statement::{Statement, parse_condition, parse_for, parse_statement},
    },
    lts::core::{Lts, StateType},
};

/// Parses every transition label of `lts` again and attaches the result.
///
/// Used after loading a program record, which stores labels as text. The
/// reverse index is rebuilt as well.
///
/// # Errors
/// `UnknownState` if a transition targets a missing state, or the grammar
/// error of a label that no longer parses.
pub fn link(lts: &mut Lts) -> CompileResult<()> {
    lts.rebuild_index()?;
    for (kind, transition) in lts.transitions_mut() {
        transition.action = Some(parse_label(kind, &transition.label, transition.line)?);
    }
    Ok(())
}

/// Parses one label the way the engine will read it from a state of type
/// `kind`.
///
/// # Errors
/// The grammar error of the label, or `UnrecognizedStatement` when a
/// statement state carries a block keyword.
pub fn parse_label(kind: StateType, label: &str, line: usize) -> ParseResult<Action> {
    match (kind, label) {
        (StateType::Undefined, _)
        | (StateType::If | StateType::While, "else" | "endwhile")
        | (StateType::For, "endfor") => Ok(Action::Pass),
        (StateType::If | StateType::While, _) => parse_condition(label, line),
        (StateType::For, _) => parse_for(label, line),
        (StateType::Return, "return") => Ok(Action::Return(None)),
        (StateType::Declare | StateType::Assign | StateType::Formula | StateType::Return, _) => {
            match parse_statement(label, line)? {
                Statement::Simple(action) => Ok(action),
                _ => Err(ParseError::UnrecognizedStatement { text: label.to_string(),
                                                             line }),
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::core::compile;

    #[test]
    fn relinking_reproduces_compiled_actions() {
        let source = "\
整数型: s ← 0
for (i を 1 から 10 まで 2 ずつ増やす)
    s ← s + i
endfor
do
    s ← s - 1
while (s > 20)
if (s = 20)
    return s
endif
";
        let compiled = compile(source).unwrap().main;
        let mut loaded = compiled.clone();
        for (_, transition) in loaded.transitions_mut() {
            transition.action = None;
        }
        link(&mut loaded).unwrap();
        assert_eq!(loaded, compiled);
    }

    #[test]
    fn sentinels_link_as_pass() {
        assert_eq!(parse_label(StateType::While, "else", 1), Ok(Action::Pass));
        assert_eq!(parse_label(StateType::For, "endfor", 1), Ok(Action::Pass));
        assert_eq!(parse_label(StateType::Undefined, "", 1), Ok(Action::Pass));
        assert!(matches!(parse_label(StateType::Assign, "endif", 4),
                         Err(ParseError::UnrecognizedStatement { line: 4, .. })));
    }
}
