//! Batch builder invariants.

use kindling::session::{TokenBatch, DEFAULT_SEQ};
use kindling::EngineError;

#[test]
fn chunk_batch_assigns_contiguous_positions() {
    let batch = TokenBatch::for_chunk(&[5, 6, 7], 40, true).unwrap();
    assert_eq!(batch.len(), 3);
    let positions: Vec<u32> = batch.entries().iter().map(|e| e.pos).collect();
    assert_eq!(positions, vec![40, 41, 42]);
    assert!(batch.entries().iter().all(|e| e.seq == DEFAULT_SEQ));
}

#[test]
fn logits_mark_lands_only_on_the_last_entry() {
    let batch = TokenBatch::for_chunk(&[5, 6, 7], 0, true).unwrap();
    let marks: Vec<bool> = batch.entries().iter().map(|e| e.wants_logits).collect();
    assert_eq!(marks, vec![false, false, true]);
}

#[test]
fn intermediate_chunk_requests_no_logits() {
    let batch = TokenBatch::for_chunk(&[5, 6, 7], 0, false).unwrap();
    assert!(batch.entries().iter().all(|e| !e.wants_logits));
}

#[test]
fn empty_chunk_builds_an_empty_batch() {
    let batch = TokenBatch::for_chunk(&[], 0, true).unwrap();
    assert!(batch.is_empty());
    assert_eq!(batch.len(), 0);
}

#[test]
fn single_token_batch_always_wants_logits() {
    let batch = TokenBatch::single(42, 7);
    assert_eq!(batch.len(), 1);
    let entry = batch.entries()[0];
    assert_eq!(entry.token, 42);
    assert_eq!(entry.pos, 7);
    assert_eq!(entry.seq, DEFAULT_SEQ);
    assert!(entry.wants_logits);
}

#[test]
fn push_past_capacity_is_rejected() {
    let mut batch = TokenBatch::with_capacity(2);
    batch.push(1, 0, false).unwrap();
    batch.push(2, 1, true).unwrap();
    match batch.push(3, 2, true) {
        Err(EngineError::BatchCapacity { len, capacity }) => {
            assert_eq!(len, 3);
            assert_eq!(capacity, 2);
        }
        other => panic!("expected BatchCapacity, got {other:?}"),
    }
    // The failed push left the batch untouched.
    assert_eq!(batch.len(), 2);
}
