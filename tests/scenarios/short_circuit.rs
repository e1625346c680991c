//! Test: Short-circuit gates - falsy existence/check stop without error

use crate::helpers::*;
use http::HeaderMap;
use serde_json::json;
use volter::{Gate, Outcome, Pipeline, ServerError};

struct Counters {
    existence: CallCounter,
    check: CallCounter,
    transform: CallCounter,
    terminal: CallCounter,
}

impl Counters {
    fn new() -> Self {
        Self {
            existence: CallCounter::new(),
            check: CallCounter::new(),
            transform: CallCounter::new(),
            terminal: CallCounter::new(),
        }
    }

    fn pipeline(&self, exists: bool, allowed: bool) -> Pipeline<Signup, Signup, (), Signup, ServerError> {
        Pipeline::builder("gated", signup_schema(), passthrough())
            .existence(gate(&self.existence, exists))
            .check(gate(&self.check, allowed))
            .transform(echo(&self.transform))
            .update(echo(&self.terminal))
            .build()
            .unwrap()
    }
}

#[tokio::test]
async fn test_existence_false_skips_everything_after() {
    let counters = Counters::new();
    let outcome = counters
        .pipeline(false, true)
        .run(json!({"email": "a@b.com"}), None)
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Skipped(Gate::Existence));
    assert!(outcome.is_skipped());
    assert_eq!(counters.existence.count(), 1);
    assert_eq!(counters.check.count(), 0);
    assert_eq!(counters.transform.count(), 0);
    assert_eq!(counters.terminal.count(), 0);
}

#[tokio::test]
async fn test_check_false_skips_transform_and_terminal() {
    let counters = Counters::new();
    let outcome = counters
        .pipeline(true, false)
        .run(json!({"email": "a@b.com"}), None)
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Skipped(Gate::Check));
    assert_eq!(counters.existence.count(), 1);
    assert_eq!(counters.check.count(), 1);
    assert_eq!(counters.transform.count(), 0);
    assert_eq!(counters.terminal.count(), 0);
}

#[tokio::test]
async fn test_open_gates_run_in_order() {
    let counters = Counters::new();
    let outcome = counters
        .pipeline(true, true)
        .run(json!({"email": "a@b.com"}), None)
        .await
        .unwrap();

    assert!(outcome.completed().is_some());
    assert_eq!(counters.existence.count(), 1);
    assert_eq!(counters.check.count(), 1);
    assert_eq!(counters.transform.count(), 1);
    assert_eq!(counters.terminal.count(), 1);
}

/// The resolver flattens skipped outcomes to `None`
#[tokio::test]
async fn test_resolve_skipped_is_none() {
    let counters = Counters::new();
    let pipeline = counters.pipeline(false, true);

    let value = pipeline
        .resolve((), json!({"email": "a@b.com"}), &HeaderMap::new(), ())
        .await
        .unwrap();
    assert_eq!(value, None);

    let outcome = pipeline
        .resolve_outcome(json!({"email": "a@b.com"}), &HeaderMap::new())
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Skipped(Gate::Existence));
    assert_eq!(counters.terminal.count(), 0);
}

/// A failing gate is an error, not a skip
#[tokio::test]
async fn test_gate_failure_is_routed() {
    let terminal = CallCounter::new();
    let pipeline: Pipeline<Signup, Signup, (), Signup, ServerError> =
        Pipeline::builder("broken", signup_schema(), passthrough())
            .existence(|_input, _session| async move { Err::<bool, _>(anyhow::anyhow!("lookup timed out")) })
            .insert(echo(&terminal))
            .build()
            .unwrap();

    let err = pipeline.run(json!({"email": "a@b.com"}), None).await.unwrap_err();
    assert_eq!(err.code, volter::ErrorCode::InternalServerError);
    assert_eq!(terminal.count(), 0);
}
