//! Template compiler for text with embedded script.
//!
//! A template is ordinary text plus three kinds of embedded code:
//!
//! - a line starting with `~` is a script statement,
//! - the lines between two `~-` lines are a block of script statements,
//! - `#|expr|#` is replaced by the value of `expr`.
//!
//! Compilation runs the pipeline scanner → lexer → generator and yields one
//! script fragment in which literal text becomes `append("...")` calls.
//! Rendering runs that fragment against an [`Environment`] and returns what
//! it appended.
//!
//! # Quick start
//!
//! ```
//! use ecogen::{Environment, render};
//!
//! let source = "~for (let i = 0; i < 3; i++) {\n  n=#|i|#\n~}\n";
//! let out = render(source, &mut Environment::new()).unwrap();
//! assert_eq!(out, "  n=0\n  n=1\n  n=2\n");
//! ```
//!
//! ## Variables from the caller
//!
//! ```
//! use ecogen::{Environment, Template};
//!
//! let template = Template::compile("Hello, #|name.toUpperCase()|#!");
//! let mut env = Environment::new().with("name", "world");
//! assert_eq!(template.render(&mut env).unwrap(), "Hello, WORLD!");
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod environment;
pub mod generator;
pub mod lexer;
pub mod runner;
pub mod scanner;
pub mod script;
pub mod syntax;
pub mod token;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

pub use environment::Environment;
pub use generator::{Fragment, escape_string, generate};
pub use lexer::{tokenize, tokenize_with};
pub use runner::{APPEND, Evaluator, OUTPUT, Runner};
pub use script::{Engine, ScriptError, ScriptErrorKind, Value};
pub use syntax::Syntax;
pub use token::{Span, Token, TokenKind};

/// Unified error type for rendering.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The generated script failed to parse or run.
    #[error("{0}")]
    Eval(#[from] ScriptError),
    /// A template or environment file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The environment file is not a JSON object.
    #[error("invalid environment: {0}")]
    Environment(#[from] serde_json::Error),
}

/// A compiled template: its tokens and the generated script fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    tokens: Vec<Token>,
    fragment: Fragment,
}

impl Template {
    /// Compile with the default sentinels. Compilation never fails.
    #[must_use]
    pub fn compile(source: &str) -> Self {
        Self::compile_with(source, &Syntax::default())
    }

    #[must_use]
    pub fn compile_with(source: &str, syntax: &Syntax) -> Self {
        let tokens = tokenize_with(source, syntax);
        let fragment = generate(&tokens);
        Self { tokens, fragment }
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    #[must_use]
    pub const fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    /// The generated script source.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.fragment.code
    }

    /// Render with the built-in [`Engine`].
    pub fn render(&self, env: &mut Environment) -> Result<String, ScriptError> {
        self.render_with(&Runner::new(), env)
    }

    pub fn render_with<E: Evaluator>(
        &self,
        runner: &Runner<E>,
        env: &mut Environment,
    ) -> Result<String, ScriptError> {
        runner.run(&self.fragment, env)
    }

    /// Template position of the token whose generated code raised `err`.
    ///
    /// ```
    /// use ecogen::{Environment, Span, Template};
    ///
    /// let template = Template::compile("line one\n~let a = missing;\n");
    /// let err = template.render(&mut Environment::new()).unwrap_err();
    /// assert_eq!(template.locate(&err), Some(Span::new(1, 0)));
    /// ```
    #[must_use]
    pub fn locate(&self, err: &ScriptError) -> Option<Span> {
        self.fragment.origin(err.span.row)
    }
}

/// Compile and render `source` in one step.
pub fn render(source: &str, env: &mut Environment) -> Result<String, Error> {
    Ok(Template::compile(source).render(env)?)
}

/// Render a template file, optionally with a JSON object file as the
/// initial environment.
pub fn render_file(path: impl AsRef<Path>, env_path: Option<&Path>) -> Result<String, Error> {
    let path = path.as_ref();
    let source = read(path)?;
    let mut env = match env_path {
        Some(env_path) => Environment::from_json(&read(env_path)?)?,
        None => Environment::new(),
    };
    debug!(path = %path.display(), vars = env.len(), "rendering template file");
    render(&source, &mut env)
}

fn read(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}
