//! Error types for the generation session core.
//!
//! Every variant is recoverable at the host boundary: a failed call leaves
//! the session in a well-defined state and never panics the caller.

use thiserror::Error;

/// Errors that can occur while loading a model or stepping a session.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Model file unreadable/invalid, or context/sampler construction
    /// failed. Not retryable without a different path or parameters.
    #[error("Model load failed: {0}")]
    Load(String),

    /// The prompt could not be converted to tokens. The session stays
    /// usable; a subsequent call re-enters the priming path.
    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    /// The prompt alone meets or exceeds context capacity. The session
    /// stays EMPTY; retry with a shorter prompt.
    #[error("Prompt too large: {tokens} tokens for context of {capacity}")]
    PromptTooLarge { tokens: usize, capacity: usize },

    /// The decode capability rejected a submitted batch. During priming
    /// the cursor is rolled back to 0; during stepping it is unchanged.
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Advancing the cursor would meet or exceed context capacity.
    /// Terminal for the current cache contents; reset before continuing.
    #[error("Context exhausted: cursor {cursor} of {capacity}")]
    ContextExhausted { cursor: usize, capacity: usize },

    /// A batch was filled past its configured capacity.
    #[error("Batch capacity exceeded: {len} entries, capacity {capacity}")]
    BatchCapacity { len: usize, capacity: usize },
}

impl EngineError {
    /// True for conditions a caller can recover from without reloading
    /// the model.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Load(_))
    }
}
