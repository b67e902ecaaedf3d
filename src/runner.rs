//! Executes a generated fragment and collects its output.

use tracing::debug;

use crate::environment::Environment;
use crate::generator::Fragment;
use crate::script::{Engine, Native, ScriptError, Value};

/// Name of the output accumulator installed into the environment.
pub const OUTPUT: &str = "_output";

/// Name of the append primitive installed into the environment.
pub const APPEND: &str = "append";

/// Something that can execute a script fragment.
///
/// The environment serves as the global scope; top-level declarations
/// made by the fragment must be written into it.
pub trait Evaluator {
    /// Execute `code` with `env` as its global scope.
    ///
    /// # Errors
    ///
    /// Returns the syntax or runtime error that stopped execution.
    fn execute(&self, code: &str, env: &mut Environment) -> Result<(), ScriptError>;
}

/// Runs fragments with an evaluator.
#[derive(Debug, Clone, Default)]
pub struct Runner<E = Engine> {
    evaluator: E,
}

impl Runner {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            evaluator: Engine::new(),
        }
    }
}

impl<E: Evaluator> Runner<E> {
    #[must_use]
    pub const fn with_evaluator(evaluator: E) -> Self {
        Self { evaluator }
    }

    #[must_use]
    pub const fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Execute `fragment` against `env` and return what it appended.
    ///
    /// `_output` and `append` are (re)installed before execution, so a
    /// reused environment starts each run with empty output.
    ///
    /// # Errors
    ///
    /// Propagates the evaluator's error unchanged; no partial output is
    /// returned.
    pub fn run(&self, fragment: &Fragment, env: &mut Environment) -> Result<String, ScriptError> {
        env.set(OUTPUT, "");
        env.set(APPEND, Value::Native(Native::Append));

        self.evaluator.execute(&fragment.code, env)?;

        let output = env.get(OUTPUT).map(Value::to_display).unwrap_or_default();
        debug!(bytes = output.len(), "template rendered");
        Ok(output)
    }
}
