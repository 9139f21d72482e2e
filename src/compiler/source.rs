use crate::{error::ParseError, interpreter::parser::core::ParseResult};

/// One non-blank line of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// The 1-based line number in the original text.
    pub number: usize,
    /// The number of leading spaces.
    pub indent: usize,
    /// The statement text without indentation, trailing space or comment.
    pub text:   String,
}

/// Splits source text into statement lines.
///
/// A leading byte order mark is ignored, `//` starts a comment that runs to
/// the end of the line, and lines that are blank after removing the comment
/// are dropped. Indentation is counted in ASCII spaces.
///
/// # Errors
/// Returns `ParseError::Indentation` for a line indented with a tab or a
/// full-width space.
///
/// # Example
/// ```
/// use gijigo::compiler::source::split_lines;
///
/// let lines = split_lines("x ← 1 // one\n\nif (x = 1)\n    x ← 2\n").unwrap();
/// assert_eq!(lines.len(), 3);
/// assert_eq!(lines[0].text, "x ← 1");
/// assert_eq!((lines[2].number, lines[2].indent), (4, 4));
/// ```
pub fn split_lines(source: &str) -> ParseResult<Vec<SourceLine>> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut lines = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let number = index + 1;
        let code = raw.find("//").map_or(raw, |start| &raw[..start]).trim_end();
        if code.trim().is_empty() {
            continue;
        }
        let text = code.trim_start_matches(' ');
        if text.starts_with(char::is_whitespace) {
            return Err(ParseError::Indentation { line: number });
        }
        lines.push(SourceLine { number,
                                indent: code.len() - text.len(),
                                text: text.to_string() });
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_order_mark_and_comments_are_dropped() {
        let lines = split_lines("\u{feff}// header\n  a ← 1  \n").unwrap();
        assert_eq!(lines,
                   vec![SourceLine { number: 2,
                                     indent: 2,
                                     text:   "a ← 1".into(), }]);
    }

    #[test]
    fn tabs_and_full_width_spaces_are_rejected() {
        assert_eq!(split_lines("a ← 1\n\tb ← 2"), Err(ParseError::Indentation { line: 2 }));
        assert_eq!(split_lines("\u{3000}b ← 2"), Err(ParseError::Indentation { line: 1 }));
    }
}
