//! Load-time configuration for a generation session.
//!
//! All fields have safe defaults. Configuration is validated before use.

use std::path::PathBuf;

use crate::error::EngineError;

/// Parameters for loading a model and sizing its decode context.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Path to the model file (GGUF for the llama backend).
    pub model_path: PathBuf,
    /// Worker threads for decode. 0 = auto (logical cores, capped at 16).
    pub n_threads: u32,
    /// Layers to offload to the accelerator. Ignored unless
    /// `use_accelerator` is set.
    pub n_gpu_layers: u32,
    /// Context capacity in tokens. Upper bound on prompt length plus
    /// generated continuation.
    pub n_ctx: u32,
    /// Maximum tokens submitted to decode in one batch. Longer prompts
    /// are split into consecutive chunks of at most this size.
    pub n_batch: u32,
    /// Whether to offload layers to an accelerator at all.
    pub use_accelerator: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            n_threads: 0,
            n_gpu_layers: 0,
            n_ctx: 4096,
            n_batch: 512,
            use_accelerator: false,
        }
    }
}

impl LoadConfig {
    /// Create a configuration for the given model path, everything else
    /// default.
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: path.into(),
            ..Self::default()
        }
    }

    /// Validate configuration values. Returns error on invalid values.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.model_path.as_os_str().is_empty() {
            return Err(EngineError::Load("model path is empty".into()));
        }
        if self.n_ctx < 2 {
            // One prompt token plus one generated token is the minimum
            // useful session.
            return Err(EngineError::Load("n_ctx must be at least 2".into()));
        }
        if self.n_batch == 0 {
            return Err(EngineError::Load("n_batch must be > 0".into()));
        }
        Ok(())
    }

    /// Effective accelerator layer count: 0 when offload is disabled.
    pub fn effective_gpu_layers(&self) -> u32 {
        if self.use_accelerator {
            self.n_gpu_layers
        } else {
            0
        }
    }
}
