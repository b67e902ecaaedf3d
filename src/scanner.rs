//! Character scanner with row/column bookkeeping.

use std::fmt;

use crate::token::Span;

/// One scanned character and where it sits in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Character {
    pub ch: char,
    pub row: usize,
    pub column: usize,
}

impl Character {
    #[must_use]
    pub const fn span(&self) -> Span {
        Span {
            row: self.row,
            column: self.column,
        }
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at {}", self.ch, self.span())
    }
}

/// Walks a source string one character at a time.
///
/// `next` returns `None` once the input is exhausted; it never panics,
/// so callers may keep pulling after the end.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    chars: std::str::Chars<'a>,
    row: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars(),
            row: 0,
            column: 0,
        }
    }

    /// Whether unread characters remain.
    #[must_use]
    pub fn has_next(&self) -> bool {
        !self.chars.as_str().is_empty()
    }

    /// The next raw character, without advancing.
    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    /// Consume the next character if it equals `expected`.
    pub fn next_if_eq(&mut self, expected: char) -> Option<Character> {
        if self.peek() == Some(expected) {
            self.next()
        } else {
            None
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Character;

    fn next(&mut self) -> Option<Character> {
        let ch = self.chars.next()?;
        let c = Character {
            ch,
            row: self.row,
            column: self.column,
        };
        if ch == '\n' {
            self.row += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_reset_after_newline() {
        let chars: Vec<_> = Scanner::new("ab\nc").collect();
        assert_eq!(chars.len(), 4);
        assert_eq!((chars[0].row, chars[0].column), (0, 0));
        assert_eq!((chars[1].row, chars[1].column), (0, 1));
        // the newline itself still sits on the line it ends
        assert_eq!((chars[2].row, chars[2].column), (0, 2));
        assert_eq!((chars[3].row, chars[3].column), (1, 0));
    }

    #[test]
    fn next_past_end_is_none() {
        let mut s = Scanner::new("x");
        assert!(s.has_next());
        assert_eq!(s.next().map(|c| c.ch), Some('x'));
        assert!(!s.has_next());
        assert!(s.next().is_none());
        assert!(s.next().is_none());
    }

    #[test]
    fn peek_does_not_advance() {
        let mut s = Scanner::new("#|");
        assert_eq!(s.peek(), Some('#'));
        assert_eq!(s.peek(), Some('#'));
        let first = s.next().expect("first char");
        assert_eq!(first.ch, '#');
        assert_eq!(s.peek(), Some('|'));
        assert!(s.next_if_eq('x').is_none());
        assert_eq!(s.next_if_eq('|').map(|c| c.column), Some(1));
        assert_eq!(s.peek(), None);
    }

    #[test]
    fn multibyte_characters_count_as_one_column() {
        let chars: Vec<_> = Scanner::new("éx").collect();
        assert_eq!(chars[1].column, 1);
    }
}
