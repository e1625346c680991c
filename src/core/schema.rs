//! Input schemas - the "parse or fail" capability every pipeline starts with

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use thiserror::Error;

/// Parses raw input into a typed value
pub trait Schema<T>: Send + Sync {
    fn parse(&self, raw: &Value) -> Result<T, ValidationError>;
}

impl<T, F> Schema<T> for F
where
    F: Fn(&Value) -> Result<T, ValidationError> + Send + Sync,
{
    fn parse(&self, raw: &Value) -> Result<T, ValidationError> {
        self(raw)
    }
}

/// A single problem found while parsing input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Path to the offending field, empty for the whole input
    pub path: Vec<String>,
    pub message: String,
}

impl Issue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
        }
    }

    pub fn at(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: vec![field.into()],
            message: message.into(),
        }
    }
}

/// Input failed its schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<Issue>,
}

impl ValidationError {
    pub fn single(issue: Issue) -> Self {
        Self {
            issues: vec![issue],
        }
    }

    /// All issues joined into one line
    pub fn summary(&self) -> String {
        summarize(&self.issues)
    }
}

fn summarize(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|issue| {
            if issue.path.is_empty() {
                issue.message.clone()
            } else {
                format!("{}: {}", issue.path.join("."), issue.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

type Rule<T> = Box<dyn Fn(&T) -> Option<Issue> + Send + Sync>;

/// Schema backed by serde deserialization plus field rules
///
/// ```ignore
/// let schema = SerdeSchema::<Signup>::new()
///     .rule("email", "must contain @", |s| s.email.contains('@'));
/// ```
pub struct SerdeSchema<T> {
    rules: Vec<Rule<T>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> SerdeSchema<T> {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Add a rule; `predicate` returning false reports `message` at `field`
    pub fn rule<F>(mut self, field: &str, message: &str, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let issue = Issue::at(field, message);
        self.rules
            .push(Box::new(move |value: &T| (!predicate(value)).then(|| issue.clone())));
        self
    }
}

impl<T: DeserializeOwned> Default for SerdeSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> Schema<T> for SerdeSchema<T> {
    fn parse(&self, raw: &Value) -> Result<T, ValidationError> {
        let value = T::deserialize(raw).map_err(|e| ValidationError::single(Issue::new(e.to_string())))?;

        let issues: Vec<Issue> = self.rules.iter().filter_map(|rule| rule(&value)).collect();
        if issues.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError { issues })
        }
    }
}
