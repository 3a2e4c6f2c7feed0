use super::{SourceToken, TokenizedProgram};

/// A saved place in the token stream that a cursor can be rewound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CursorPosition(usize);

impl CursorPosition {
    /// Index of the token this position points at.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A restartable view over a token sequence. Snapshotting and restoring are O(1), which is what
/// keeps trial parsing of ordered alternatives affordable.
#[derive(Clone, Debug)]
pub struct TokenCursor<'t> {
    tokens: &'t [SourceToken],
    next: usize,
}

impl<'t> TokenCursor<'t> {
    pub fn new(program: &'t TokenizedProgram) -> Self {
        Self {
            tokens: &program.tokens,
            next: 0,
        }
    }

    /// Returns the next token and moves past it, or `None` if the stream is exhausted.
    pub fn advance(&mut self) -> Option<&'t SourceToken> {
        let token = self.tokens.get(self.next)?;
        self.next += 1;
        Some(token)
    }

    /// The next token without consuming it.
    pub fn peek(&self) -> Option<&'t SourceToken> {
        self.tokens.get(self.next)
    }

    /// The most recently consumed token, if any.
    pub fn previous(&self) -> Option<&'t SourceToken> {
        self.next.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    pub fn position(&self) -> CursorPosition {
        CursorPosition(self.next)
    }

    pub fn restore(&mut self, position: CursorPosition) {
        self.next = position.0;
    }

    pub fn at_end(&self) -> bool {
        self.next >= self.tokens.len()
    }
}
