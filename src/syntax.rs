/// Sentinel characters recognised by the template lexer.
///
/// ```
/// use ecogen::Syntax;
///
/// let syntax = Syntax::new()
///     .line_sentinel('%')
///     .expression_markers(['{', '{'], ['}', '}']);
/// assert_eq!(syntax.line, '%');
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax {
    /// Starts a directive line (`~`).
    pub line: char,
    /// Second character of the block sentinel (`~-`).
    pub block: char,
    /// Expression start marker (`#|`).
    pub open: [char; 2],
    /// Expression end marker (`|#`).
    pub close: [char; 2],
    /// Only honour the line sentinel in column 0.
    pub line_start_only: bool,
}

impl Syntax {
    /// The default grammar: `~`, `~-`, `#|` and `|#`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            line: '~',
            block: '-',
            open: ['#', '|'],
            close: ['|', '#'],
            line_start_only: true,
        }
    }

    /// Set the directive line sentinel. The block sentinel follows it.
    #[must_use]
    pub const fn line_sentinel(mut self, ch: char) -> Self {
        self.line = ch;
        self
    }

    /// Set the character that turns the line sentinel into a block sentinel.
    #[must_use]
    pub const fn block_marker(mut self, ch: char) -> Self {
        self.block = ch;
        self
    }

    /// Set both expression markers.
    #[must_use]
    pub const fn expression_markers(mut self, open: [char; 2], close: [char; 2]) -> Self {
        self.open = open;
        self.close = close;
        self
    }

    /// Recognise the line sentinel anywhere, not only at the start of a line.
    #[must_use]
    pub const fn sentinel_anywhere(mut self) -> Self {
        self.line_start_only = false;
        self
    }

    /// Parse a two-character marker such as `"#|"`.
    #[must_use]
    pub fn marker(text: &str) -> Option<[char; 2]> {
        let mut chars = text.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(a), Some(b), None) => Some([a, b]),
            _ => None,
        }
    }
}

impl Default for Syntax {
    fn default() -> Self {
        Self::new()
    }
}
