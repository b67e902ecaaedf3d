use tracing::{debug, trace, warn};

use crate::scanner::{Character, Scanner};
use crate::syntax::Syntax;
use crate::token::{Span, Token, TokenKind};

/// Tokenize a template with the default sentinels.
///
/// The lexer never fails: an expression or block left open at the end
/// of the input is still emitted, holding everything up to the end.
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token> {
    tokenize_with(input, &Syntax::default())
}

/// Tokenize a template with custom sentinels.
#[must_use]
pub fn tokenize_with(input: &str, syntax: &Syntax) -> Vec<Token> {
    Lexer::new(input, syntax).tokenize()
}

/// Which token the lexer is currently building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Chunk,
    Line,
    Block,
    Expression,
}

impl State {
    const fn kind(self) -> TokenKind {
        match self {
            Self::Chunk => TokenKind::LiteralChunk,
            Self::Line => TokenKind::DirectiveLine,
            Self::Block => TokenKind::DirectiveBlock,
            Self::Expression => TokenKind::Expression,
        }
    }
}

struct Lexer<'a> {
    scanner: Scanner<'a>,
    syntax: &'a Syntax,
    state: State,
    text: String,
    start: Span,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str, syntax: &'a Syntax) -> Self {
        Self {
            scanner: Scanner::new(input),
            syntax,
            state: State::Chunk,
            text: String::new(),
            start: Span::default(),
            tokens: Vec::new(),
        }
    }

    fn tokenize(mut self) -> Vec<Token> {
        while let Some(c) = self.scanner.next() {
            match self.state {
                State::Chunk => self.lex_chunk(c),
                State::Line => self.lex_line(c),
                State::Block => self.lex_block(c),
                State::Expression => self.lex_expression(c),
            }
        }
        self.finish_input();

        debug!(tokens = self.tokens.len(), "template tokenized");
        self.tokens
    }

    fn lex_chunk(&mut self, c: Character) {
        let syntax = self.syntax;

        if c.ch == syntax.line && (c.column == 0 || !syntax.line_start_only) {
            self.flush_chunk();
            if self.scanner.next_if_eq(syntax.block).is_some() {
                // the rest of the opening line is a comment
                self.skip_line();
                self.begin(State::Block, c.span());
            } else {
                self.skip_blanks();
                self.begin(State::Line, c.span());
            }
        } else if c.ch == syntax.open[0] && self.scanner.peek() == Some(syntax.open[1]) {
            self.flush_chunk();
            self.scanner.next();
            self.begin(State::Expression, c.span());
        } else {
            if self.text.is_empty() {
                self.start = c.span();
            }
            self.text.push(c.ch);
        }
    }

    fn lex_line(&mut self, c: Character) {
        if c.ch == '\n' {
            if self.text.ends_with('\r') {
                self.text.pop();
            }
            self.emit();
        } else {
            self.text.push(c.ch);
        }
    }

    fn lex_block(&mut self, c: Character) {
        if c.ch == self.syntax.line && self.scanner.next_if_eq(self.syntax.block).is_some() {
            self.skip_line();
            self.emit();
        } else {
            self.text.push(c.ch);
        }
    }

    fn lex_expression(&mut self, c: Character) {
        if c.ch == self.syntax.close[0] && self.scanner.next_if_eq(self.syntax.close[1]).is_some() {
            self.emit();
        } else {
            self.text.push(c.ch);
        }
    }

    fn finish_input(&mut self) {
        match self.state {
            State::Chunk => self.flush_chunk(),
            State::Line => self.emit(),
            State::Block | State::Expression => {
                warn!(
                    kind = %self.state.kind(),
                    at = %self.start,
                    "unterminated token at end of input"
                );
                self.emit();
            }
        }
    }

    fn begin(&mut self, state: State, start: Span) {
        self.state = state;
        self.start = start;
    }

    /// Finalize the pending literal chunk, if there is one.
    fn flush_chunk(&mut self) {
        if self.state == State::Chunk && !self.text.is_empty() {
            self.emit();
        }
    }

    fn emit(&mut self) {
        let token = Token::new(
            self.state.kind(),
            std::mem::take(&mut self.text),
            self.start,
        );
        trace!(kind = %token.kind, at = %token.span, text = ?token.text, "token");
        self.tokens.push(token);
        self.state = State::Chunk;
    }

    fn skip_line(&mut self) {
        for c in self.scanner.by_ref() {
            if c.ch == '\n' {
                break;
            }
        }
    }

    fn skip_blanks(&mut self) {
        while matches!(self.scanner.peek(), Some(' ' | '\t')) {
            self.scanner.next();
        }
    }
}
