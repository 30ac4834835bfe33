//! Source-located diagnostics.

use std::fmt;

use crate::source::{Location, Span};

/// Severity of a [`Diagnostic`].
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Note => "note",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// The compiler stage that raised a [`Diagnostic`].
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum System {
    /// Malformed token.
    Lexer,
    /// A grammar production could not match its required tokens.
    Parser,
    /// Well-formed but meaningless construct.
    Resolver,
    /// A transform rejected or could not rewrite its input.
    Transform,
}

/// A single message tied to a source location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub system: System,
    pub location: Option<Location>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(system: System, location: Option<Location>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            system,
            location,
            message: message.into(),
        }
    }
}

/// Formats as `<line>:<column>: <message>`, or just the message when the
/// diagnostic has no location.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(f, "{}:{}: {}", loc.line, loc.column, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// An ordered list of diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Records an error at the beginning of `span`.
    pub fn add_error(&mut self, system: System, span: Span, message: impl Into<String>) {
        self.add(Diagnostic::error(system, Some(span.begin), message));
    }

    /// Records an error that has no meaningful source position.
    pub fn add_error_unlocated(&mut self, system: System, message: impl Into<String>) {
        self.add(Diagnostic::error(system, None, message));
    }

    pub fn add_warning(&mut self, system: System, span: Span, message: impl Into<String>) {
        self.add(Diagnostic {
            severity: Severity::Warning,
            system,
            location: Some(span.begin),
            message: message.into(),
        });
    }

    /// Appends every diagnostic of `other`.
    pub fn extend(&mut self, other: &Diagnostics) {
        self.items.extend(other.items.iter().cloned());
    }

    /// Returns `true` if any diagnostic has error severity.
    pub fn contains_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// The first error-severity diagnostic, if any.
    pub fn first_error(&self) -> Option<&Diagnostic> {
        self.items.iter().find(|d| d.severity == Severity::Error)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }
}

/// One diagnostic per line, in the order they were recorded.
impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diag) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diag}")?;
        }
        Ok(())
    }
}
