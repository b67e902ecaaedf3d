#![allow(dead_code)]

use ecogen::{Environment, ScriptError, Template, Token, TokenKind, render};

/// Render `source` with an empty environment, panicking on failure.
pub fn render_ok(source: &str) -> String {
    render(source, &mut Environment::new()).unwrap_or_else(|e| {
        panic!(
            "render failed: {e}\n\
             --- template ---\n{source}\n\
             --- code ---\n{}",
            Template::compile(source).code()
        )
    })
}

/// Render `source` and return the script error it must fail with.
pub fn render_err(source: &str) -> ScriptError {
    match Template::compile(source).render(&mut Environment::new()) {
        Ok(out) => panic!("expected an error, rendered {out:?}"),
        Err(e) => e,
    }
}

pub fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|t| t.kind).collect()
}

pub fn texts(tokens: &[Token]) -> Vec<&str> {
    tokens.iter().map(|t| t.text.as_str()).collect()
}
