use std::fmt;

use serde::Serialize;

/// Source location, zero-based.
///
/// Displayed one-based, which is how editors report positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Span {
    pub row: usize,
    pub column: usize,
}

impl Span {
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.row + 1, self.column + 1)
    }
}

/// Token kinds produced by the template lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Raw text copied to the output.
    LiteralChunk,
    /// Statement text of a single `~` line.
    DirectiveLine,
    /// Statement text between two `~-` lines.
    DirectiveBlock,
    /// Expression text between `#|` and `|#`.
    Expression,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LiteralChunk => "literal chunk",
            Self::DirectiveLine => "directive line",
            Self::DirectiveBlock => "directive block",
            Self::Expression => "expression",
        };
        f.write_str(name)
    }
}

/// A single token with its kind, text, and source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}
