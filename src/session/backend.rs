//! Capability seam between the session state machine and the model.
//!
//! The session consumes tokenization, decode, and sampling as opaque
//! capabilities so the state machine can be exercised without a native
//! inference library behind it.

use crate::error::EngineError;
use crate::session::batch::TokenBatch;
use crate::session::TokenId;
use crate::telemetry::MemoryUsage;

/// Everything a [`Session`](crate::session::Session) needs from the
/// model side: vocabulary, decode engine, and sampler chain.
///
/// Implementations own their KV cache and sampler state outright; the
/// session serializes all access, so methods never race each other.
pub trait SessionBackend: Send {
    /// Convert prompt text to token ids, with beginning-of-sequence and
    /// special-token handling enabled.
    fn tokenize(&self, text: &str) -> Result<Vec<TokenId>, EngineError>;

    /// Detokenize one id to its piece text. Stateful across calls where
    /// the vocabulary splits multi-byte characters over several tokens.
    fn token_to_piece(&mut self, token: TokenId) -> Result<String, EngineError>;

    /// Whether this id is an end-of-generation marker.
    fn is_end_of_generation(&self, token: TokenId) -> bool;

    /// Context capacity in tokens (the fixed cache size).
    fn context_capacity(&self) -> usize;

    /// Largest batch the decode engine accepts in one pass.
    fn batch_capacity(&self) -> usize;

    /// Submit one batch. On success the cache holds every submitted
    /// position; on failure the whole batch is not-applied and the
    /// caller must not assume partial success.
    fn decode(&mut self, batch: &TokenBatch) -> Result<(), EngineError>;

    /// Select the next token id from the logits of the most recent
    /// successful decode.
    fn sample(&mut self) -> Result<TokenId, EngineError>;

    /// Wipe the entire cache for this session's sequence and clear any
    /// sampler selection state.
    fn clear(&mut self);

    /// Advisory telemetry snapshot. Never consulted for control
    /// decisions.
    fn memory_usage(&self) -> MemoryUsage {
        MemoryUsage::default()
    }
}
