//! Kindling — on-device autoregressive text-generation session core.
//!
//! The execution layer behind an interactive generation UI: it owns the
//! session state machine that tokenizes a prompt, primes a fixed-size
//! KV cache in batches, then samples and commits one token per call
//! until the model stops or the context window fills.
//!
//! What this crate deliberately does not do: parse model files, run the
//! forward pass, or implement sampling math. Those arrive through the
//! [`session::SessionBackend`] seam; the shipped implementation (behind
//! the `llama` feature) delegates to llama.cpp via `llama-cpp-2`.
//!
//! # Typical use
//!
//! ```no_run
//! # #[cfg(feature = "llama")] {
//! use kindling::{LoadConfig, llama};
//!
//! let config = LoadConfig::for_path("/models/tiny.gguf");
//! let session = llama::load_session(&config).expect("load");
//! // First call primes the prompt and yields the first piece; later
//! // calls continue from the cache (their prompt argument is ignored).
//! let piece = session.generate_next_piece("Once upon a time");
//! # let _ = piece;
//! # }
//! ```

pub mod config;
pub mod error;
pub mod session;
pub mod telemetry;

#[cfg(feature = "llama")]
pub mod llama;

pub use config::LoadConfig;
pub use error::EngineError;
pub use session::{Session, SessionBackend, StepOutcome, TokenBatch, TokenId};
pub use telemetry::{init_logging, LogConfig, LogError, LogFormat, MemoryUsage};
