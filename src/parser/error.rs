use codespan_reporting::diagnostic::{Diagnostic, Label};

use crate::lexer::{Span, Token, describe_token};

/// Secondary annotation attached to a [`ParseError`].
#[derive(Debug, Clone)]
pub struct Note {
    pub span: Span,
    pub message: String,
}

// Parse error
//
// A diagnostic is a value: it is returned up the call chain and embedded
// into an error-kind declaration node, never pushed onto a global list.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub notes: Vec<Note>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    /// Append a secondary note. Notes keep their insertion order.
    pub fn with_note(mut self, span: Span, message: impl Into<String>) -> Self {
        self.add_note(span, message);
        self
    }

    pub fn add_note(&mut self, span: Span, message: impl Into<String>) {
        self.notes.push(Note {
            span,
            message: message.into(),
        });
    }

    pub(super) fn unexpected_token(expected: &str, token: &Token, source: &str) -> Self {
        Self::new(
            format!(
                "Expected {}, found {}",
                expected,
                describe_token(token, source)
            ),
            token.span,
        )
    }

    /// Render as a codespan diagnostic: a primary label on the error span
    /// and one secondary label per note.
    pub fn diagnostic(&self) -> Diagnostic<()> {
        let mut labels = vec![Label::primary((), self.span.range())];
        labels.extend(
            self.notes
                .iter()
                .map(|note| Label::secondary((), note.span.range()).with_message(&note.message)),
        );
        Diagnostic::error()
            .with_message(&self.message)
            .with_labels(labels)
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Parse error at bytes {}..{}: {}",
            self.span.start, self.span.end, self.message
        )
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notes_keep_order() {
        let err = ParseError::new("bad declaration", Span::new(0, 3))
            .with_note(Span::new(0, 1), "first note")
            .with_note(Span::new(2, 3), "second note");

        assert_eq!(err.notes.len(), 2);
        assert_eq!(err.notes[0].message, "first note");
        assert_eq!(err.notes[1].message, "second note");
    }

    #[test]
    fn test_diagnostic_has_primary_and_secondary_labels() {
        let err = ParseError::new("found unrecognized token", Span::new(4, 5))
            .with_note(Span::new(4, 5), "this token is not allowed in the global context");
        let diagnostic = err.diagnostic();

        assert_eq!(diagnostic.message, "found unrecognized token");
        assert_eq!(diagnostic.labels.len(), 2);
    }
}
