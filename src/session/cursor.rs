//! Sequence cursor: how many tokens are committed into the KV cache.
//!
//! The cursor doubles as the absolute position of the next token to
//! submit. It only ever moves forward, except through `reset`.

/// Count of tokens already committed for this session's sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeqCursor(usize);

impl SeqCursor {
    /// A cursor at the origin (nothing committed, session EMPTY).
    pub fn new() -> Self {
        Self(0)
    }

    /// Current committed-token count; also the next absolute position.
    pub fn get(self) -> usize {
        self.0
    }

    /// True while no tokens have been committed.
    pub fn at_origin(self) -> bool {
        self.0 == 0
    }

    /// Advance past `n` newly committed tokens (bulk priming).
    pub fn advance(&mut self, n: usize) {
        self.0 += n;
    }

    /// Advance past exactly one committed token (stepping).
    pub fn bump(&mut self) {
        self.0 += 1;
    }

    /// Return to the origin. The only backwards movement allowed.
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}
