use std::fmt;

use super::error::{ScriptError, ScriptErrorKind};
use crate::token::Span;

/// Reserved words of the script language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Let,
    Var,
    Const,
    If,
    Else,
    For,
    While,
    Do,
    Break,
    Continue,
    Function,
    Return,
    True,
    False,
    Null,
    Undefined,
    Typeof,
}

impl Keyword {
    fn from_ident(ident: &str) -> Option<Self> {
        Some(match ident {
            "let" => Self::Let,
            "var" => Self::Var,
            "const" => Self::Const,
            "if" => Self::If,
            "else" => Self::Else,
            "for" => Self::For,
            "while" => Self::While,
            "do" => Self::Do,
            "break" => Self::Break,
            "continue" => Self::Continue,
            "function" => Self::Function,
            "return" => Self::Return,
            "true" => Self::True,
            "false" => Self::False,
            "null" => Self::Null,
            "undefined" => Self::Undefined,
            "typeof" => Self::Typeof,
            _ => return None,
        })
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Let => "let",
            Self::Var => "var",
            Self::Const => "const",
            Self::If => "if",
            Self::Else => "else",
            Self::For => "for",
            Self::While => "while",
            Self::Do => "do",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Function => "function",
            Self::Return => "return",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Typeof => "typeof",
        }
    }
}

/// Punctuation and operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Question,
    Dot,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    Bang,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    EqEq,
    EqEqEq,
    NotEq,
    NotEqEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    QuestionQuestion,
}

/// Longest spellings first so that `===` wins over `==` and `=`.
const SYMBOLS: &[(&str, Symbol)] = &[
    ("===", Symbol::EqEqEq),
    ("!==", Symbol::NotEqEq),
    ("**", Symbol::StarStar),
    ("++", Symbol::PlusPlus),
    ("--", Symbol::MinusMinus),
    ("+=", Symbol::PlusAssign),
    ("-=", Symbol::MinusAssign),
    ("*=", Symbol::StarAssign),
    ("/=", Symbol::SlashAssign),
    ("%=", Symbol::PercentAssign),
    ("==", Symbol::EqEq),
    ("!=", Symbol::NotEq),
    ("<=", Symbol::Le),
    (">=", Symbol::Ge),
    ("&&", Symbol::AndAnd),
    ("||", Symbol::OrOr),
    ("??", Symbol::QuestionQuestion),
    ("(", Symbol::LParen),
    (")", Symbol::RParen),
    ("{", Symbol::LBrace),
    ("}", Symbol::RBrace),
    ("[", Symbol::LBracket),
    ("]", Symbol::RBracket),
    (",", Symbol::Comma),
    (";", Symbol::Semicolon),
    (":", Symbol::Colon),
    ("?", Symbol::Question),
    (".", Symbol::Dot),
    ("+", Symbol::Plus),
    ("-", Symbol::Minus),
    ("*", Symbol::Star),
    ("/", Symbol::Slash),
    ("%", Symbol::Percent),
    ("!", Symbol::Bang),
    ("=", Symbol::Assign),
    ("<", Symbol::Lt),
    (">", Symbol::Gt),
];

impl Symbol {
    pub fn as_str(self) -> &'static str {
        SYMBOLS
            .iter()
            .find(|(_, sym)| *sym == self)
            .map_or("?", |(text, _)| text)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.as_str())
    }
}

/// Lexeme kinds produced by the script lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum LexemeKind {
    Number(f64),
    Str(String),
    Ident(String),
    Keyword(Keyword),
    Symbol(Symbol),
}

impl fmt::Display for LexemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "number {n}"),
            Self::Str(s) => write!(f, "string {s:?}"),
            Self::Ident(name) => write!(f, "identifier {name}"),
            Self::Keyword(kw) => write!(f, "'{}'", kw.as_str()),
            Self::Symbol(sym) => write!(f, "{sym}"),
        }
    }
}

/// A single lexeme with its kind and fragment location.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub kind: LexemeKind,
    pub span: Span,
    /// A newline separates this lexeme from the previous one.
    pub line_break_before: bool,
}

/// Split script source into lexemes. Whitespace and comments are dropped.
///
/// # Errors
///
/// Returns `ScriptError` on unterminated strings or comments, bad
/// escapes, or characters that cannot start a lexeme.
pub fn lex(input: &str) -> Result<Vec<Lexeme>, ScriptError> {
    Lexer::new(input).lex()
}

struct Lexer {
    input: Vec<char>,
    pos: usize,
    row: usize,
    col: usize,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            row: 0,
            col: 0,
        }
    }

    fn lex(mut self) -> Result<Vec<Lexeme>, ScriptError> {
        let mut lexemes = Vec::new();
        let mut line_break_before = false;

        while let Some(ch) = self.peek() {
            let span = self.span();
            let kind = match ch {
                '\n' => {
                    line_break_before = true;
                    self.advance();
                    continue;
                }
                c if c.is_whitespace() => {
                    self.advance();
                    continue;
                }
                '/' if self.peek_at(1) == Some('/') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                    continue;
                }
                '/' if self.peek_at(1) == Some('*') => {
                    if self.skip_block_comment(span)? {
                        line_break_before = true;
                    }
                    continue;
                }
                '"' | '\'' => LexemeKind::Str(self.read_string(ch, span)?),
                c if c.is_ascii_digit() => LexemeKind::Number(self.read_number(span)?),
                '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                    LexemeKind::Number(self.read_number(span)?)
                }
                c if c.is_alphabetic() || c == '_' || c == '$' => {
                    let ident = self.read_ident();
                    Keyword::from_ident(&ident)
                        .map_or(LexemeKind::Ident(ident), LexemeKind::Keyword)
                }
                c => match self.read_symbol() {
                    Some(sym) => LexemeKind::Symbol(sym),
                    None => {
                        return Err(ScriptError::new(
                            ScriptErrorKind::UnexpectedCharacter(c),
                            span,
                        ));
                    }
                },
            };

            lexemes.push(Lexeme {
                kind,
                span,
                line_break_before,
            });
            line_break_before = false;
        }

        Ok(lexemes)
    }

    const fn span(&self) -> Span {
        Span {
            row: self.row,
            column: self.col,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.row += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    /// Returns whether the comment spanned a newline.
    fn skip_block_comment(&mut self, start: Span) -> Result<bool, ScriptError> {
        self.advance(); // skip /
        self.advance(); // skip *
        let mut newline = false;
        loop {
            match self.advance() {
                None => {
                    return Err(ScriptError::new(
                        ScriptErrorKind::UnterminatedComment,
                        start,
                    ));
                }
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    return Ok(newline);
                }
                Some('\n') => newline = true,
                Some(_) => {}
            }
        }
    }

    fn read_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }
        ident
    }

    fn read_number(&mut self, start: Span) -> Result<f64, ScriptError> {
        let mut text = String::new();
        self.take_digits(&mut text);

        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.advance();
            self.take_digits(&mut text);
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            text.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                text.push(sign);
                self.advance();
            }
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(ScriptError::new(ScriptErrorKind::InvalidNumber(text), start));
            }
            self.take_digits(&mut text);
        }

        if self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            text.push(self.peek().unwrap_or_default());
            return Err(ScriptError::new(ScriptErrorKind::InvalidNumber(text), start));
        }

        text.parse()
            .map_err(|_| ScriptError::new(ScriptErrorKind::InvalidNumber(text), start))
    }

    fn take_digits(&mut self, text: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_string(&mut self, quote: char, start: Span) -> Result<String, ScriptError> {
        self.advance(); // skip opening quote

        let mut value = String::new();
        loop {
            match self.advance() {
                None | Some('\n') => {
                    return Err(ScriptError::new(
                        ScriptErrorKind::UnterminatedString,
                        start,
                    ));
                }
                Some(c) if c == quote => return Ok(value),
                Some('\\') => {
                    let escape_span = self.span();
                    value.push(self.read_escape(escape_span)?);
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn read_escape(&mut self, span: Span) -> Result<char, ScriptError> {
        let invalid = |seq: String| ScriptError::new(ScriptErrorKind::InvalidEscape(seq), span);

        match self.advance() {
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('t') => Ok('\t'),
            Some('0') => Ok('\0'),
            Some(c @ ('\\' | '"' | '\'')) => Ok(c),
            Some('x') => {
                let hex = self.take_hex(2);
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 2)
                    .and_then(char::from_u32)
                    .ok_or_else(|| invalid(format!("x{hex}")))
            }
            Some('u') if self.peek() == Some('{') => {
                self.advance();
                let hex = self.take_hex(6);
                if self.advance() != Some('}') || hex.is_empty() {
                    return Err(invalid(format!("u{{{hex}")));
                }
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| invalid(format!("u{{{hex}}}")))
            }
            Some('u') => {
                let hex = self.take_hex(4);
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| invalid(format!("u{hex}")))
            }
            Some(c) => Err(invalid(c.to_string())),
            None => Err(ScriptError::new(ScriptErrorKind::UnterminatedString, span)),
        }
    }

    fn take_hex(&mut self, max: usize) -> String {
        let mut hex = String::new();
        while hex.len() < max {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(c);
                    self.advance();
                }
                _ => break,
            }
        }
        hex
    }

    fn read_symbol(&mut self) -> Option<Symbol> {
        let (text, sym) = SYMBOLS.iter().find(|(text, _)| {
            text.chars()
                .enumerate()
                .all(|(i, c)| self.peek_at(i) == Some(c))
        })?;
        for _ in 0..text.chars().count() {
            self.advance();
        }
        Some(*sym)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<LexemeKind> {
        lex(input)
            .expect("should lex")
            .into_iter()
            .map(|l| l.kind)
            .collect()
    }

    #[test]
    fn declaration() {
        assert_eq!(
            kinds("let x = 3;"),
            [
                LexemeKind::Keyword(Keyword::Let),
                LexemeKind::Ident("x".into()),
                LexemeKind::Symbol(Symbol::Assign),
                LexemeKind::Number(3.0),
                LexemeKind::Symbol(Symbol::Semicolon),
            ]
        );
    }

    #[test]
    fn longest_operator_wins() {
        assert_eq!(
            kinds("a === b !== c ** 2"),
            [
                LexemeKind::Ident("a".into()),
                LexemeKind::Symbol(Symbol::EqEqEq),
                LexemeKind::Ident("b".into()),
                LexemeKind::Symbol(Symbol::NotEqEq),
                LexemeKind::Ident("c".into()),
                LexemeKind::Symbol(Symbol::StarStar),
                LexemeKind::Number(2.0),
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("1.5 .25 2e3 7"),
            [
                LexemeKind::Number(1.5),
                LexemeKind::Number(0.25),
                LexemeKind::Number(2000.0),
                LexemeKind::Number(7.0),
            ]
        );
        assert!(lex("12abc").is_err());
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#""a\n\"b\"\\" 'it\'s' "\u{1F600}A\x42""#),
            [
                LexemeKind::Str("a\n\"b\"\\".into()),
                LexemeKind::Str("it's".into()),
                LexemeKind::Str("\u{1F600}AB".into()),
            ]
        );
    }

    #[test]
    fn bad_escape() {
        let err = lex(r#""\q""#).unwrap_err();
        assert_eq!(err.kind, ScriptErrorKind::InvalidEscape("q".into()));
    }

    #[test]
    fn unterminated_string() {
        let err = lex("x = \"open").unwrap_err();
        assert_eq!(err.kind, ScriptErrorKind::UnterminatedString);
        assert_eq!(err.span, Span::new(0, 4));
    }

    #[test]
    fn comments_and_line_breaks() {
        let lexemes = lex("a // note\n/* multi\nline */ b /* inline */ c").expect("should lex");
        assert_eq!(lexemes.len(), 3);
        assert!(!lexemes[0].line_break_before);
        assert!(lexemes[1].line_break_before);
        assert!(!lexemes[2].line_break_before);
        assert_eq!(lexemes[1].span, Span::new(2, 8));
    }

    #[test]
    fn unexpected_character() {
        let err = lex("a @ b").unwrap_err();
        assert_eq!(err.kind, ScriptErrorKind::UnexpectedCharacter('@'));
    }
}
