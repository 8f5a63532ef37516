//! Load-failure paths of the llama backend.
//!
//! These need the native library but no model asset: every test
//! exercises a path that must fail cleanly before inference starts.

#![cfg(feature = "llama")]

use kindling::llama;
use kindling::{EngineError, LoadConfig};

#[test]
fn missing_model_file_fails_with_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoadConfig::for_path(dir.path().join("does-not-exist.gguf"));
    match llama::load_session(&config) {
        Err(EngineError::Load(_)) => {}
        Err(e) => panic!("expected Load error, got {e:?}"),
        Ok(_) => panic!("expected Load error, got a session"),
    }
}

#[test]
fn garbage_model_file_fails_with_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.gguf");
    std::fs::write(&path, b"not a gguf file").unwrap();
    let config = LoadConfig::for_path(&path);
    assert!(matches!(
        llama::load_session(&config),
        Err(EngineError::Load(_))
    ));
}

#[test]
fn invalid_config_is_rejected_before_touching_the_backend() {
    let config = LoadConfig::default(); // empty path
    assert!(matches!(
        llama::load_session(&config),
        Err(EngineError::Load(_))
    ));
}
