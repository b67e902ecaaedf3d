use std::fmt;

use crate::token::Span;

/// Classifies a script error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptErrorKind {
    /// Character that cannot start any token.
    UnexpectedCharacter(char),
    /// String literal without its closing quote.
    UnterminatedString,
    /// `/*` without `*/`.
    UnterminatedComment,
    /// Unknown or malformed escape sequence.
    InvalidEscape(String),
    /// Malformed numeric literal.
    InvalidNumber(String),
    /// Expected one thing, found another.
    UnexpectedToken { expected: String, found: String },
    /// Input ended in the middle of a construct.
    UnexpectedEnd { expected: String },
    /// Left side of an assignment or update is not assignable.
    InvalidAssignmentTarget,
    /// Read of a name that is bound nowhere.
    UndefinedVariable(String),
    /// Called something that is not a function.
    NotCallable(String),
    /// Operation applied to an unsuitable value.
    Type(String),
    /// Assignment to a `const` binding.
    ConstAssignment(String),
    /// Same name declared twice in one block with `let`/`const`.
    Redeclaration(String),
    /// `break` outside a loop.
    BreakOutsideLoop,
    /// `continue` outside a loop.
    ContinueOutsideLoop,
    /// `return` outside a function.
    ReturnOutsideFunction,
    /// Statements or expressions nested deeper than the parser allows.
    NestingTooDeep(usize),
    /// Function calls nested deeper than the engine allows.
    CallDepthExceeded(usize),
}

impl fmt::Display for ScriptErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter(ch) => write!(f, "unexpected character: {ch:?}"),
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::UnterminatedComment => write!(f, "unterminated block comment"),
            Self::InvalidEscape(seq) => write!(f, "invalid escape sequence: \\{seq}"),
            Self::InvalidNumber(text) => write!(f, "invalid number: {text}"),
            Self::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected}, got {found}")
            }
            Self::UnexpectedEnd { expected } => {
                write!(f, "unexpected end of script, expected {expected}")
            }
            Self::InvalidAssignmentTarget => write!(f, "invalid assignment target"),
            Self::UndefinedVariable(name) => write!(f, "{name} is not defined"),
            Self::NotCallable(what) => write!(f, "{what} is not a function"),
            Self::Type(msg) => write!(f, "type error: {msg}"),
            Self::ConstAssignment(name) => {
                write!(f, "assignment to constant variable {name}")
            }
            Self::Redeclaration(name) => {
                write!(f, "identifier {name} has already been declared")
            }
            Self::BreakOutsideLoop => write!(f, "break outside of a loop"),
            Self::ContinueOutsideLoop => write!(f, "continue outside of a loop"),
            Self::ReturnOutsideFunction => write!(f, "return outside of a function"),
            Self::NestingTooDeep(limit) => {
                write!(f, "nesting deeper than {limit} levels")
            }
            Self::CallDepthExceeded(limit) => {
                write!(f, "maximum call depth of {limit} exceeded")
            }
        }
    }
}

/// Error produced while parsing or executing a script fragment.
///
/// The span points into the fragment, not the template; see
/// [`crate::Template::locate`] to map it back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {span}")]
pub struct ScriptError {
    pub kind: ScriptErrorKind,
    pub span: Span,
}

impl ScriptError {
    #[must_use]
    pub const fn new(kind: ScriptErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Whether the error was raised before any statement ran.
    #[must_use]
    pub const fn is_syntax(&self) -> bool {
        matches!(
            self.kind,
            ScriptErrorKind::UnexpectedCharacter(_)
                | ScriptErrorKind::UnterminatedString
                | ScriptErrorKind::UnterminatedComment
                | ScriptErrorKind::InvalidEscape(_)
                | ScriptErrorKind::InvalidNumber(_)
                | ScriptErrorKind::UnexpectedToken { .. }
                | ScriptErrorKind::UnexpectedEnd { .. }
                | ScriptErrorKind::InvalidAssignmentTarget
                | ScriptErrorKind::BreakOutsideLoop
                | ScriptErrorKind::ContinueOutsideLoop
                | ScriptErrorKind::ReturnOutsideFunction
                | ScriptErrorKind::NestingTooDeep(_)
        )
    }
}
