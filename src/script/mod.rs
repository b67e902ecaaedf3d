//! The script language that directives and expressions are written in.
//!
//! A small JavaScript-flavoured statement language: `let`/`const`/`var`,
//! `if`, `for`, `for..of`, `while`, functions, arrays, objects and the
//! usual operators. Fragments are lexed, parsed into an AST and run by a
//! tree-walking [`Engine`].

pub mod ast;
pub mod builtins;
mod error;
mod interp;
pub mod lexer;
pub mod parser;
mod value;

pub use builtins::Native;
pub use error::{ScriptError, ScriptErrorKind};
pub use interp::{DEFAULT_MAX_CALL_DEPTH, Engine};
pub use parser::{MAX_NESTING, parse};
pub use value::{Value, format_number};
