//! Batch builder: the unit of work submitted to the decode capability.
//!
//! A batch is ephemeral — built, decoded, and discarded within a single
//! call. Every entry belongs to the session's single logical sequence;
//! there is no multi-sequence branching here.

use crate::error::EngineError;
use crate::session::TokenId;

/// The one sequence index every entry is assigned to.
pub const DEFAULT_SEQ: u32 = 0;

/// One slot of a decode batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchEntry {
    /// Token id to feed through the model.
    pub token: TokenId,
    /// Absolute position in the sequence cache.
    pub pos: u32,
    /// Sequence membership (always [`DEFAULT_SEQ`]).
    pub seq: u32,
    /// Whether logits must be computed at this position.
    pub wants_logits: bool,
}

/// An ordered, capacity-bounded set of tokens for one decode pass.
#[derive(Debug, Clone)]
pub struct TokenBatch {
    entries: Vec<BatchEntry>,
    capacity: usize,
}

impl TokenBatch {
    /// Create an empty batch with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a batch from one consecutive chunk of tokens.
    ///
    /// Positions are assigned from `start_pos` upward. When
    /// `logits_at_last` is set, only the final entry requests logits —
    /// the pattern used for the final chunk of prompt priming.
    pub fn for_chunk(
        tokens: &[TokenId],
        start_pos: usize,
        logits_at_last: bool,
    ) -> Result<Self, EngineError> {
        let mut batch = Self::with_capacity(tokens.len());
        for (i, &token) in tokens.iter().enumerate() {
            let wants_logits = logits_at_last && i + 1 == tokens.len();
            batch.push(token, start_pos + i, wants_logits)?;
        }
        Ok(batch)
    }

    /// Build a single-token batch that requests logits — the stepping
    /// pattern.
    pub fn single(token: TokenId, pos: usize) -> Self {
        let mut batch = Self::with_capacity(1);
        // Cannot overflow a capacity of 1.
        let _ = batch.push(token, pos, true);
        batch
    }

    /// Append one entry. Fails once the configured capacity is reached.
    pub fn push(
        &mut self,
        token: TokenId,
        pos: usize,
        wants_logits: bool,
    ) -> Result<(), EngineError> {
        if self.entries.len() >= self.capacity {
            return Err(EngineError::BatchCapacity {
                len: self.entries.len() + 1,
                capacity: self.capacity,
            });
        }
        self.entries.push(BatchEntry {
            token,
            pos: pos as u32,
            seq: DEFAULT_SEQ,
            wants_logits,
        });
        Ok(())
    }

    /// Entries in submission order.
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
