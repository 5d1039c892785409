//! Diagnostic sink: formats fatal errors with filename, line, and caret.
//!
//! Every phase (lexer, parser, resolver, codegen) reports failures as a
//! [`CompileError`], a thin wrapper over [`subc_base::SpannedError`]. This
//! module is what knows how to turn that into one of two text forms:
//!
//! - Without token context: `<message>\n`.
//! - With token context: `<filename>:<line>: <source line>\n<padding>^ <message>\n`.
//!
//! No phase in this crate calls `std::process::exit` directly — only
//! `main.rs` does, after rendering a [`CompileError`] with [`render`].

use subc_base::{Span, SpannedError};

/// A fatal compiler error, carrying an optional source span.
///
/// `span: None` means "no token context" — used for argument/IO errors
/// that occur before there is any source buffer to point into.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub message: String,
    pub span: Option<Span>,
}

impl CompileError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        CompileError {
            message: message.into(),
            span: Some(span),
        }
    }

    /// An error with no source location, e.g. a CLI usage error.
    pub fn bare(message: impl Into<String>) -> Self {
        CompileError {
            message: message.into(),
            span: None,
        }
    }
}

impl From<SpannedError> for CompileError {
    fn from(e: SpannedError) -> Self {
        CompileError::new(e.message, e.span)
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CompileError {}

/// Result alias used throughout the compiler pipeline.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Renders a [`CompileError`] as compiler diagnostics usually look on the
/// command line, given the filename and full source buffer it occurred in.
///
/// Without a span, this is just the message. With a span, it locates the
/// 1-based line containing `span.start`, reproduces that source line, and
/// places a caret under the offending byte, using the `<filename>:<line>: `
/// prefix width as the caret's offset basis.
pub fn render(err: &CompileError, filename: &str, source: &str) -> String {
    let Some(span) = err.span else {
        return format!("{}\n", err.message);
    };

    let (line_no, line_start, line_text) = locate_line(source, span.start);
    let prefix = format!("{}:{}: ", filename, line_no);
    let col = span.start - line_start;
    let padding = " ".repeat(prefix.len() + col);

    format!("{prefix}{line_text}\n{padding}^ {}\n", err.message)
}

/// Finds the 1-based line number, the byte offset where that line starts,
/// and the line's text (without the trailing newline) for a byte offset
/// into `source`.
fn locate_line(source: &str, offset: usize) -> (usize, usize, &str) {
    let offset = offset.min(source.len());
    let mut line_no = 1;
    let mut line_start = 0;

    for (i, b) in source.as_bytes()[..offset].iter().enumerate() {
        if *b == b'\n' {
            line_no += 1;
            line_start = i + 1;
        }
    }

    let line_end = source[line_start..]
        .find('\n')
        .map(|i| line_start + i)
        .unwrap_or(source.len());

    (line_no, line_start, &source[line_start..line_end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_error_has_no_caret() {
        let err = CompileError::bare("usage: subc <file>");
        assert_eq!(render(&err, "a.c", ""), "usage: subc <file>\n");
    }

    #[test]
    fn spanned_error_on_first_line() {
        let source = "int main() {\n  return x;\n}\n";
        let x_offset = source.find('x').unwrap();
        let err = CompileError::new("undefined variable", Span::new(x_offset, x_offset + 1));
        let rendered = render(&err, "a.c", source);
        assert!(rendered.starts_with("a.c:2:   return x;\n"));
        assert!(rendered.contains("^ undefined variable"));
    }

    #[test]
    fn caret_aligns_under_offending_byte() {
        let source = "int x = y;\n";
        let y_offset = source.find('y').unwrap();
        let err = CompileError::new("undefined variable", Span::new(y_offset, y_offset + 1));
        let rendered = render(&err, "t.c", source);
        let lines: Vec<&str> = rendered.lines().collect();
        let caret_col = lines[1].find('^').unwrap();
        let source_col = lines[0].find('y').unwrap();
        assert_eq!(caret_col, source_col);
    }

    #[test]
    fn locate_line_finds_correct_line_and_start() {
        let source = "aaa\nbbb\nccc\n";
        let (line, start, text) = locate_line(source, 5);
        assert_eq!(line, 2);
        assert_eq!(start, 4);
        assert_eq!(text, "bbb");
    }
}
