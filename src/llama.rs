//! llama-cpp-2 backend for GGUF models.
//!
//! Owns the model, a persistent decode context (so the KV cache
//! survives between calls), and a greedy sampler chain. Enabled with
//! the `llama` feature.

use std::num::NonZeroU32;
use std::sync::OnceLock;

use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::context::LlamaContext;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{AddBos, LlamaModel};
use llama_cpp_2::sampling::LlamaSampler;
use llama_cpp_2::token::LlamaToken;
use tracing::info;

use crate::config::LoadConfig;
use crate::error::EngineError;
use crate::session::{Session, SessionBackend, TokenBatch, TokenId};
use crate::telemetry::{self, MemoryUsage};

/// A session over the llama backend.
pub type LlamaSession = Session<LlamaSessionBackend>;

/// Load a GGUF model and wrap it in an EMPTY session.
pub fn load_session(config: &LoadConfig) -> Result<LlamaSession, EngineError> {
    Ok(Session::new(LlamaSessionBackend::load(config)?))
}

/// Global llama.cpp backend (process-wide, can only be initialized once,
/// never torn down mid-process).
static LLAMA_BACKEND: OnceLock<Result<LlamaBackend, String>> = OnceLock::new();

fn global_backend() -> Result<&'static LlamaBackend, EngineError> {
    let result = LLAMA_BACKEND.get_or_init(|| {
        let mut backend = LlamaBackend::init().map_err(|e| e.to_string())?;
        backend.void_logs();
        Ok(backend)
    });
    result
        .as_ref()
        .map_err(|e| EngineError::Load(format!("backend init: {e}")))
}

/// Model, decode context, and sampler chain for one session.
///
/// Field order is the teardown order: sampler, then context, then
/// model — the reverse of acquisition. `ctx` borrows the boxed model;
/// the box is never moved or dropped while `ctx` is alive, which is
/// what makes the erased lifetime below sound.
pub struct LlamaSessionBackend {
    sampler: LlamaSampler,
    decoder: encoding_rs::Decoder,
    ctx: LlamaContext<'static>,
    model: Box<LlamaModel>,
    n_ctx: usize,
    n_batch: usize,
}

// SAFETY: LlamaModel and LlamaBackend are Send+Sync in llama-cpp-2, and
// the context is only touched under the owning session's lock.
unsafe impl Send for LlamaSessionBackend {}

impl LlamaSessionBackend {
    /// Load a GGUF model from disk and build its decode context and
    /// greedy sampler chain. Any failure releases what was already
    /// acquired; a partially valid backend is never returned.
    pub fn load(config: &LoadConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let backend = global_backend()?;

        let model_params =
            LlamaModelParams::default().with_n_gpu_layers(config.effective_gpu_layers());
        let model = Box::new(
            LlamaModel::load_from_file(backend, &config.model_path, &model_params)
                .map_err(|e| EngineError::Load(format!("model load: {e}")))?,
        );

        let n_threads = resolve_threads(config.n_threads);
        let ctx_params = LlamaContextParams::default()
            .with_n_ctx(NonZeroU32::new(config.n_ctx))
            .with_n_threads(n_threads)
            .with_n_threads_batch(n_threads)
            .with_n_batch(config.n_batch);

        // SAFETY: the context borrows the heap-allocated model. The box
        // stays in place for the backend's whole life and drops after
        // the context (field order above).
        let model_ref: &'static LlamaModel =
            unsafe { &*(model.as_ref() as *const LlamaModel) };
        let ctx = model_ref
            .new_context(backend, ctx_params)
            .map_err(|e| EngineError::Load(format!("context init: {e}")))?;

        info!(
            path = %config.model_path.display(),
            n_ctx = config.n_ctx,
            n_batch = config.n_batch,
            n_threads,
            gpu_layers = config.effective_gpu_layers(),
            "model loaded"
        );
        telemetry::record_session_loaded();

        Ok(Self {
            sampler: greedy_chain(),
            decoder: encoding_rs::UTF_8.new_decoder(),
            ctx,
            model,
            n_ctx: config.n_ctx as usize,
            n_batch: config.n_batch as usize,
        })
    }
}

impl SessionBackend for LlamaSessionBackend {
    fn tokenize(&self, text: &str) -> Result<Vec<TokenId>, EngineError> {
        let tokens = self
            .model
            .str_to_token(text, AddBos::Always)
            .map_err(|e| EngineError::Tokenization(format!("tokenize: {e}")))?;
        Ok(tokens.into_iter().map(|t| t.0 as TokenId).collect())
    }

    fn token_to_piece(&mut self, token: TokenId) -> Result<String, EngineError> {
        // The decoder persists across pieces so a multi-byte character
        // split over two tokens still renders once complete.
        self.model
            .token_to_piece(LlamaToken(token as i32), &mut self.decoder, true, None)
            .map_err(|e| EngineError::Tokenization(format!("detokenize: {e}")))
    }

    fn is_end_of_generation(&self, token: TokenId) -> bool {
        self.model.is_eog_token(LlamaToken(token as i32))
    }

    fn context_capacity(&self) -> usize {
        self.n_ctx
    }

    fn batch_capacity(&self) -> usize {
        self.n_batch
    }

    fn decode(&mut self, batch: &TokenBatch) -> Result<(), EngineError> {
        let mut native = LlamaBatch::new(batch.len().max(1), 1);
        for entry in batch.entries() {
            native
                .add(
                    LlamaToken(entry.token as i32),
                    entry.pos as i32,
                    &[entry.seq as i32],
                    entry.wants_logits,
                )
                .map_err(|e| EngineError::Decode(format!("batch fill: {e}")))?;
        }
        self.ctx
            .decode(&mut native)
            .map_err(|e| EngineError::Decode(format!("decode: {e}")))
    }

    fn sample(&mut self) -> Result<TokenId, EngineError> {
        // -1 samples from the last position that had logits computed.
        let token = self.sampler.sample(&self.ctx, -1);
        self.sampler.accept(token);
        Ok(token.0 as TokenId)
    }

    fn clear(&mut self) {
        self.ctx.clear_kv_cache();
        // Greedy selection is stateless; rebuilding the chain is the
        // reset.
        self.sampler = greedy_chain();
        self.decoder = encoding_rs::UTF_8.new_decoder();
    }

    fn memory_usage(&self) -> MemoryUsage {
        MemoryUsage {
            resident_mb: self.model.size() as f32 / (1024.0 * 1024.0),
            ..MemoryUsage::default()
        }
    }
}

fn greedy_chain() -> LlamaSampler {
    LlamaSampler::chain_simple(vec![LlamaSampler::greedy()])
}

fn resolve_threads(n: u32) -> i32 {
    if n == 0 {
        // Inference is memory-bound; use logical cores but cap to avoid
        // diminishing returns on high-core systems.
        let optimal = num_cpus::get().max(1).min(16);
        i32::try_from(optimal).unwrap_or(4)
    } else {
        i32::try_from(n).unwrap_or(4)
    }
}
