//! Test: Error routing - every failure leaves through the classifier

use crate::helpers::*;
use http::{HeaderMap, StatusCode};
use serde_json::json;
use std::fmt;
use volter::error::{ConstraintDetail, DetailConstraintRule};
use volter::{Classifier, ErrorCode, Pipeline, ServerError};

/// Error shaped like a client/server relational driver's
#[derive(Debug)]
struct RelationalError {
    detail: String,
    constraint: String,
}

impl fmt::Display for RelationalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "duplicate key value violates unique constraint \"{}\"", self.constraint)
    }
}

impl std::error::Error for RelationalError {}

impl ConstraintDetail for RelationalError {
    fn detail(&self) -> Option<&str> {
        Some(&self.detail)
    }

    fn constraint(&self) -> Option<&str> {
        Some(&self.constraint)
    }
}

fn relational_classifier() -> Classifier {
    Classifier::new().with_rule(DetailConstraintRule::<RelationalError>::new())
}

fn insert_failing_with(
    constraint: &'static str,
) -> Pipeline<Signup, Signup, (), Signup, ServerError> {
    Pipeline::builder("signup", signup_schema(), relational_classifier().route(|e| e))
        .insert(move |input: Signup, _session| async move {
            Err::<Signup, anyhow::Error>(
                RelationalError {
                    detail: format!("Key (email)=({}) already exists.", input.email),
                    constraint: constraint.to_string(),
                }
                .into(),
            )
        })
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_unique_violation_becomes_already_exists() {
    let err = insert_failing_with("users_email_unique")
        .run(json!({"email": "a@b.com"}), None)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::AlreadyExists);
    assert_eq!(err.at, Some(vec!["email".to_string()]));
    assert_eq!(err.message, "Key (email)=(a@b.com) already exists.");
}

#[tokio::test]
async fn test_non_unique_constraint_is_internal() {
    let err = insert_failing_with("users_age_check")
        .run(json!({"email": "a@b.com"}), None)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InternalServerError);
    assert_eq!(err.at, None);
}

/// Context added around a driver error does not hide it
#[tokio::test]
async fn test_wrapped_driver_error_still_recognized() {
    let pipeline: Pipeline<Signup, Signup, (), Signup, ServerError> =
        Pipeline::builder("signup", signup_schema(), relational_classifier().route(|e| e))
            .insert(|_input: Signup, _session| async move {
                let result: Result<Signup, RelationalError> = Err(RelationalError {
                    detail: "Key (id)=(1) already exists.".to_string(),
                    constraint: "users_pkey".to_string(),
                });
                anyhow::Context::context(result, "Failed to insert user")
            })
            .build()
            .unwrap();

    let err = pipeline.run(json!({"email": "a@b.com"}), None).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AlreadyExists);
    assert_eq!(err.at, Some(vec!["users".to_string()]));
}

#[tokio::test]
async fn test_invalid_input_from_both_entry_points() {
    let pipeline = insert_failing_with("users_email_unique");

    let err = pipeline.run(json!({"email": "nope"}), None).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);
    assert_eq!(err.at, None);

    let err = pipeline
        .resolve((), json!({"mail": "a@b.com"}), &HeaderMap::new(), ())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);
}

#[test]
fn test_classify_is_idempotent() {
    let classifier = relational_classifier();
    let normalized = ServerError::already_exists("taken", vec!["email".to_string()]);

    let once = classifier.classify(&normalized.clone().into());
    let twice = classifier.classify(&once.clone().into());

    assert_eq!(once, normalized);
    assert_eq!(twice, normalized);
}

#[test]
fn test_unknown_error_is_internal() {
    let normalized = relational_classifier().classify(&anyhow::anyhow!("socket closed"));
    assert_eq!(normalized.code, ErrorCode::InternalServerError);
    assert_eq!(normalized.message, "Unexpected error");
}

/// The caller's resolver decides the pipeline's error type
#[tokio::test]
async fn test_custom_resolver_shapes_errors() {
    let on_error = Classifier::new().route(|e: ServerError| (e.code.status(), e.message));
    let terminal = CallCounter::new();
    let pipeline: Pipeline<Signup, Signup, (), Signup, (StatusCode, String)> =
        Pipeline::builder("signup", signup_schema(), on_error)
            .require_auth()
            .insert(echo(&terminal))
            .build()
            .unwrap();

    let (status, message) = pipeline
        .resolve((), json!({"email": "a@b.com"}), &HeaderMap::new(), ())
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message, "Authorization header is not provided");

    let (status, _) = pipeline.run(json!({}), None).await.unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(terminal.count(), 0);
}
