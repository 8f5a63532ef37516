//! Generation session: the state machine between host and model.
//!
//! A session is EMPTY (cursor at origin, no cache primed) or PRIMED
//! (cache holds the prompt plus every generated continuation token).
//! The first call with a non-empty prompt primes the cache in bulk;
//! every call after that performs one sample → emit → re-encode →
//! advance cycle. The cache is append-only: no token is ever
//! re-submitted, so continuation cost stays O(1) per token regardless
//! of prompt length.

mod backend;
mod batch;
mod cursor;

pub use backend::SessionBackend;
pub use batch::{BatchEntry, TokenBatch, DEFAULT_SEQ};
pub use cursor::SeqCursor;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::telemetry::{self, MemoryUsage};

/// A token id as produced by the vocabulary capability.
pub type TokenId = u32;

/// What one generation call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// One token was committed; here is its piece text.
    Piece(String),
    /// The model sampled an end-of-generation marker. The cursor is
    /// unchanged; stop calling or reset for a new turn.
    Finished,
    /// Nothing to do: the session is EMPTY and the prompt was empty or
    /// tokenized to nothing.
    Idle,
}

struct SessionState<B> {
    backend: B,
    cursor: SeqCursor,
    /// Tokens awaiting encode. Only non-empty between tokenization and
    /// the end of priming.
    pending: Vec<TokenId>,
}

/// A single generation session over one loaded model.
///
/// All operations serialize under one lock: concurrent callers observe
/// strict call ordering, never parallel execution. Calls block for the
/// duration of a full decode, so keep them off latency-sensitive
/// threads.
pub struct Session<B: SessionBackend> {
    state: Mutex<SessionState<B>>,
}

impl<B: SessionBackend> Session<B> {
    /// Wrap a freshly loaded backend in an EMPTY session.
    pub fn new(backend: B) -> Self {
        Self {
            state: Mutex::new(SessionState {
                backend,
                cursor: SeqCursor::new(),
                pending: Vec::new(),
            }),
        }
    }

    /// Advance the session by one token.
    ///
    /// On an EMPTY session this first primes the cache with `prompt`.
    /// Once PRIMED the prompt argument is ignored entirely — the call is
    /// pure continuation. Injecting a new turn requires [`reset`].
    ///
    /// [`reset`]: Session::reset
    pub fn next_piece(&self, prompt: &str) -> Result<StepOutcome, EngineError> {
        let mut state = self.state.lock();

        if state.cursor.at_origin() {
            if prompt.is_empty() {
                return Ok(StepOutcome::Idle);
            }
            // Fresh turn: no stale cache or sampler state may survive.
            state.backend.clear();
            let tokens = state.backend.tokenize(prompt)?;
            if tokens.is_empty() {
                return Ok(StepOutcome::Idle);
            }
            let capacity = state.backend.context_capacity();
            if tokens.len() >= capacity {
                return Err(EngineError::PromptTooLarge {
                    tokens: tokens.len(),
                    capacity,
                });
            }
            state.pending = tokens;
            state.prime()?;
            info!(cursor = state.cursor.get(), "prompt primed");
        }

        state.step()
    }

    /// Host-boundary adapter: flatten every non-piece outcome to the
    /// empty string, as the original engine contract requires. Failure
    /// causes are logged, not surfaced.
    pub fn generate_next_piece(&self, prompt: &str) -> String {
        match self.next_piece(prompt) {
            Ok(StepOutcome::Piece(piece)) => piece,
            Ok(StepOutcome::Finished) => {
                debug!("generation finished");
                String::new()
            }
            Ok(StepOutcome::Idle) => String::new(),
            Err(e) => {
                warn!(error = %e, "generation call produced no output");
                String::new()
            }
        }
    }

    /// Return to EMPTY: cursor to 0, pending buffer dropped, the whole
    /// cache wiped, sampler state cleared. Safe whenever no call is
    /// mid-flight (the lock guarantees that for safe callers).
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.cursor.reset();
        state.pending.clear();
        state.backend.clear();
        telemetry::record_session_reset();
        debug!("session reset");
    }

    /// Committed-token count. 0 means EMPTY.
    pub fn cursor(&self) -> usize {
        self.state.lock().cursor.get()
    }

    /// Whether the cache currently holds a primed prompt.
    pub fn is_primed(&self) -> bool {
        !self.state.lock().cursor.at_origin()
    }

    /// Advisory resource snapshot. Placeholder semantics; see
    /// [`MemoryUsage`].
    pub fn memory_usage(&self) -> MemoryUsage {
        self.state.lock().backend.memory_usage()
    }

    /// Tear the session down. Taking `self` by value means no other
    /// call can be in flight — the unsafe-destruction hazard of the
    /// original engine is unrepresentable here. Backend resources are
    /// released in reverse acquisition order by their own drop glue.
    pub fn close(self) {
        drop(self);
    }
}

impl<B: SessionBackend> SessionState<B> {
    /// Bulk-encode the pending prompt tokens, one chunk per decode
    /// call, positions assigned from the cursor. Only the final token
    /// of the final chunk requests logits.
    ///
    /// Chunks are strictly sequential — each depends on the cache state
    /// left by the previous one. Any failure drops the partial priming:
    /// cursor back to 0, so the next call re-enters this path.
    fn prime(&mut self) -> Result<(), EngineError> {
        let tokens = std::mem::take(&mut self.pending);
        let total = tokens.len();
        let n_batch = self.backend.batch_capacity().max(1);
        let start = self.cursor.get();

        for (i, chunk) in tokens.chunks(n_batch).enumerate() {
            let pos = start + i * n_batch;
            let is_final_chunk = pos + chunk.len() == start + total;
            let batch = TokenBatch::for_chunk(chunk, pos, is_final_chunk)?;
            if let Err(e) = self.backend.decode(&batch) {
                warn!(chunk = i, error = %e, "prompt decode failed, dropping partial priming");
                telemetry::record_decode_failure("prime");
                self.cursor.reset();
                return Err(e);
            }
        }

        self.cursor.advance(total);
        Ok(())
    }

    /// One sample → emit → re-encode → advance cycle.
    fn step(&mut self) -> Result<StepOutcome, EngineError> {
        let id = self.backend.sample()?;

        if self.backend.is_end_of_generation(id) {
            debug!(cursor = self.cursor.get(), "end-of-generation sampled");
            return Ok(StepOutcome::Finished);
        }

        let piece = self.backend.token_to_piece(id)?;

        let capacity = self.backend.context_capacity();
        if self.cursor.get() + 1 >= capacity {
            return Err(EngineError::ContextExhausted {
                cursor: self.cursor.get(),
                capacity,
            });
        }

        let batch = TokenBatch::single(id, self.cursor.get());
        if let Err(e) = self.backend.decode(&batch) {
            // The sampled token is not committed; the cursor stays at
            // the last known-good position so a retry is safe.
            warn!(pos = self.cursor.get(), error = %e, "token decode failed");
            telemetry::record_decode_failure("step");
            return Err(e);
        }

        self.cursor.bump();
        telemetry::record_piece_generated();
        Ok(StepOutcome::Piece(piece))
    }
}
