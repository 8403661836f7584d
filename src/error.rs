//! The two error kinds a Wenyan program can fail with (§7): `文法之禍`
//! (lexing/macro-expansion/parsing failures) and `執行之禍` (runtime
//! failures). Both carry a message, a primary span, and an optional cause
//! chain, and both render through `codespan-reporting` the way the teacher
//! reports assembler errors.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::{self, termcolor::WriteColor, Config};

use crate::roman;
use crate::span::Span;

/// `文法之禍`: raised by the lexer, macro expander, or parser.
#[derive(Debug, PartialEq)]
pub struct WenyanError {
    pub message: String,
    pub span: Span,
    pub help: Option<String>,
}

impl WenyanError {
    pub fn grammar(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn diagnostic(&self, file_id: usize, roman: bool) -> Diagnostic<usize> {
        let message = if roman { roman::romanize_message(&self.message) } else { self.message.clone() };
        let mut diagnostic = Diagnostic::error().with_message(message).with_labels(vec![Label::primary(file_id, self.span.clone())]);
        if let Some(help) = &self.help {
            let help = if roman { roman::romanize_message(help) } else { help.clone() };
            diagnostic = diagnostic.with_notes(vec![help]);
        }
        diagnostic
    }
}

/// `執行之禍`: raised by the evaluator for type mismatches, out-of-bounds
/// access, division by zero, overflow, and any uncaught in-language throw.
#[derive(Debug, PartialEq)]
pub struct RuntimeError {
    pub message: String,
    pub span: Span,
    pub cause: Option<Box<RuntimeError>>,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            cause: None,
        }
    }

    pub fn caused_by(mut self, cause: RuntimeError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    fn diagnostic(&self, file_id: usize, roman: bool) -> Diagnostic<usize> {
        let apply = |s: &str| if roman { roman::romanize_message(s) } else { s.to_string() };
        let mut labels = vec![Label::primary(file_id, self.span.clone())];
        let mut notes = Vec::new();
        let mut cause = self.cause.as_deref();
        while let Some(c) = cause {
            labels.push(Label::secondary(file_id, c.span.clone()));
            notes.push(apply(&c.message));
            cause = c.cause.as_deref();
        }
        Diagnostic::error().with_message(apply(&self.message)).with_labels(labels).with_notes(notes)
    }
}

/// Emit a `WenyanError` (文法之禍) to the given writer, with source excerpts
/// drawn from `files`.
pub fn report_grammar_error(
    error: &WenyanError,
    file_id: usize,
    files: &SimpleFiles<String, String>,
    writer: &mut dyn WriteColor,
    config: &Config,
    roman: bool,
) {
    let _ = term::emit(writer, config, files, &error.diagnostic(file_id, roman));
}

/// Emit a `RuntimeError` (執行之禍) to the given writer, with source excerpts
/// drawn from `files`.
pub fn report_runtime_error(
    error: &RuntimeError,
    file_id: usize,
    files: &SimpleFiles<String, String>,
    writer: &mut dyn WriteColor,
    config: &Config,
    roman: bool,
) {
    let _ = term::emit(writer, config, files, &error.diagnostic(file_id, roman));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grammar_error_carries_message_and_span() {
        let err = WenyanError::grammar("unexpected token", 3..5);
        assert_eq!(err.message, "unexpected token");
        assert_eq!(err.span, 3..5);
    }

    #[test]
    fn runtime_error_chains_cause() {
        let cause = RuntimeError::new("division by zero", 10..12);
        let err = RuntimeError::new("could not evaluate expression", 0..20).caused_by(cause);
        assert!(err.cause.is_some());
    }
}
