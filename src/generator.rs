//! Code generator that turns a token sequence into one script fragment.
//!
//! Literal chunks and expressions become calls to the append primitive;
//! directive text is copied through verbatim, followed by a comment that
//! names the template position it came from.

use tracing::debug;

use crate::runner::APPEND;
use crate::token::{Span, Token, TokenKind};

/// Generated script text plus a map back to the template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub code: String,
    /// `(first fragment row, template span)` for every token, in order.
    pub origins: Vec<(usize, Span)>,
}

impl Fragment {
    /// Template position that produced the given fragment row.
    #[must_use]
    pub fn origin(&self, row: usize) -> Option<Span> {
        let idx = self.origins.partition_point(|(start, _)| *start <= row);
        idx.checked_sub(1).map(|i| self.origins[i].1)
    }
}

/// Generate the script fragment for a token sequence.
///
/// Generation is total: every token sequence yields a fragment. Control
/// flow spread across directives is not checked here; the evaluator
/// reports it when it parses the fragment.
#[must_use]
pub fn generate(tokens: &[Token]) -> Fragment {
    let mut out = Fragment::default();
    let mut row = 0;

    for token in tokens {
        out.origins.push((row, token.span));
        let start = out.code.len();

        match token.kind {
            TokenKind::LiteralChunk => {
                out.code.push_str(APPEND);
                out.code.push('(');
                out.code.push_str(&escape_string(&token.text));
                out.code.push_str(");\n");
            }
            TokenKind::DirectiveLine => {
                out.code.push_str(&token.text);
                out.code.push_str(&format!(" // ~ {}\n", token.span));
            }
            TokenKind::DirectiveBlock => {
                out.code.push_str(&token.text);
                if !token.text.ends_with('\n') {
                    out.code.push('\n');
                }
                out.code.push_str(&format!("// ~- {}\n", token.span));
            }
            TokenKind::Expression => {
                out.code.push_str(APPEND);
                out.code.push('(');
                out.code.push_str(&token.text);
                out.code.push_str(");\n");
            }
        }

        row += out.code[start..].matches('\n').count();
    }

    debug!(lines = row, code = %out.code, "fragment generated");
    out
}

/// Render `text` as a double-quoted script string literal.
///
/// Parsing the result back yields `text` exactly.
#[must_use]
pub fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => {
                out.push_str(&format!("\\u{{{:x}}}", u32::from(c)));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
