//! Test utility functions for volter pipelines

use futures::future::{ready, Ready};
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use volter::{Classifier, SerdeSchema, ServerError, Session, ValidationError};

/// Counts how often a step was invoked
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    calls: Arc<AtomicUsize>,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Signup {
    pub email: String,
}

pub fn signup_schema() -> SerdeSchema<Signup> {
    SerdeSchema::new().rule("email", "must contain @", |s: &Signup| s.email.contains('@'))
}

/// Signup schema that records every parse attempt
pub fn counted_schema(
    counter: &CallCounter,
) -> impl Fn(&Value) -> Result<Signup, ValidationError> + Send + Sync + 'static {
    let counter = counter.clone();
    let schema = signup_schema();
    move |raw: &Value| {
        counter.hit();
        volter::Schema::parse(&schema, raw)
    }
}

/// Error handler passing normalized errors through unchanged
pub fn passthrough() -> impl Fn(anyhow::Error) -> ServerError + Send + Sync + 'static {
    Classifier::new().route(|e| e)
}

/// Terminal or transform step returning its input and counting calls
pub fn echo<T, S>(
    counter: &CallCounter,
) -> impl Fn(T, Session<S>) -> Ready<anyhow::Result<T>> + Send + Sync + 'static
where
    T: Send + 'static,
    S: 'static,
{
    let counter = counter.clone();
    move |input: T, _session: Session<S>| {
        counter.hit();
        ready(Ok(input))
    }
}

/// Gate returning a fixed answer and counting calls
pub fn gate<T, S>(
    counter: &CallCounter,
    answer: bool,
) -> impl Fn(T, Session<S>) -> Ready<anyhow::Result<bool>> + Send + Sync + 'static
where
    T: Send + 'static,
    S: 'static,
{
    let counter = counter.clone();
    move |_input: T, _session: Session<S>| {
        counter.hit();
        ready(Ok(answer))
    }
}
