//! Test: Resolver authentication - bearer extraction and the required-header check

use crate::helpers::*;
use http::{HeaderMap, Request};
use serde_json::json;
use std::sync::{Arc, Mutex};
use volter::{ErrorCode, Outcome, Pipeline, ResolverContext, ServerError, Session};

fn request(authorization: Option<&str>) -> ResolverContext<()> {
    let mut builder = Request::builder().method("POST").uri("/graphql");
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    ResolverContext::new(builder.body(()).unwrap())
}

/// Pipeline that records every token passed to `auth` and returns the session
fn whoami(
    parses: &CallCounter,
    tokens: Arc<Mutex<Vec<String>>>,
    required: bool,
) -> Pipeline<Signup, Signup, String, Session<String>, ServerError> {
    let builder = Pipeline::builder("whoami", counted_schema(parses), passthrough());
    let builder = if required { builder.require_auth() } else { builder };
    builder
        .auth(move |token: String| {
            tokens.lock().unwrap().push(token.clone());
            async move { anyhow::Ok(format!("user:{}", token)) }
        })
        .select(|_input, session: Session<String>| async move { anyhow::Ok(session) })
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_required_header_missing_fails_before_parsing() {
    let parses = CallCounter::new();
    let tokens = Arc::new(Mutex::new(Vec::new()));
    let pipeline = whoami(&parses, tokens.clone(), true);

    let err = pipeline
        .resolve((), json!({"email": "a@b.com"}), &request(None), ())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ValidationFailed);
    assert_eq!(err.message, "Authorization header is not provided");
    assert_eq!(parses.count(), 0);
    assert!(tokens.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_required_header_with_other_scheme_fails() {
    let parses = CallCounter::new();
    let pipeline = whoami(&parses, Arc::new(Mutex::new(Vec::new())), true);

    for header in ["Basic dXNlcjpwYXNz", "Bearer "] {
        let err = pipeline
            .resolve((), json!({"email": "a@b.com"}), &request(Some(header)), ())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
    assert_eq!(parses.count(), 0);
}

#[tokio::test]
async fn test_bearer_prefix_stripped_and_auth_called_once() {
    let parses = CallCounter::new();
    let tokens = Arc::new(Mutex::new(Vec::new()));
    let pipeline = whoami(&parses, tokens.clone(), true);

    let session = pipeline
        .resolve((), json!({"email": "a@b.com"}), &request(Some("Bearer abc123")), ())
        .await
        .unwrap();

    assert_eq!(session, Some(Session::Authenticated("user:abc123".to_string())));
    assert_eq!(*tokens.lock().unwrap(), vec!["abc123".to_string()]);
    assert_eq!(parses.count(), 1);
}

/// Without `require_auth` a missing header just means an anonymous session
#[tokio::test]
async fn test_optional_auth_is_anonymous() {
    let parses = CallCounter::new();
    let tokens = Arc::new(Mutex::new(Vec::new()));
    let pipeline = whoami(&parses, tokens.clone(), false);

    let outcome = pipeline
        .resolve_outcome(json!({"email": "a@b.com"}), &HeaderMap::new())
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Completed(Session::Anonymous));
    assert!(tokens.lock().unwrap().is_empty());
}

/// `run` never demands a token, even when `require_auth` is set
#[tokio::test]
async fn test_run_auth_is_soft() {
    let parses = CallCounter::new();
    let tokens = Arc::new(Mutex::new(Vec::new()));
    let pipeline = whoami(&parses, tokens.clone(), true);

    let anonymous = pipeline.run(json!({"email": "a@b.com"}), None).await.unwrap();
    assert_eq!(anonymous, Outcome::Completed(Session::Anonymous));

    let authenticated = pipeline.run(json!({"email": "a@b.com"}), Some("xyz")).await.unwrap();
    assert_eq!(
        authenticated,
        Outcome::Completed(Session::Authenticated("user:xyz".to_string()))
    );
    assert_eq!(*tokens.lock().unwrap(), vec!["xyz".to_string()]);
}

/// Without an `auth` step the raw token is threaded through as the session
#[tokio::test]
async fn test_raw_token_session_without_auth_step() {
    let pipeline: Pipeline<Signup, Signup, String, Session<String>, ServerError> =
        Pipeline::builder("raw", signup_schema(), passthrough())
            .select(|_input, session: Session<String>| async move { anyhow::Ok(session) })
            .build()
            .unwrap();

    let mut headers = HeaderMap::new();
    headers.insert("authorization", "Bearer raw-token".parse().unwrap());

    let session = pipeline
        .resolve((), json!({"email": "a@b.com"}), &headers, ())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.token(), Some("raw-token"));
}

/// An `auth` step rejecting the token fails the invocation
#[tokio::test]
async fn test_auth_failure_is_routed() {
    let terminal = CallCounter::new();
    let pipeline: Pipeline<Signup, Signup, String, Signup, ServerError> =
        Pipeline::builder("strict", signup_schema(), passthrough())
            .require_auth()
            .auth(|_token: String| async move {
                Err::<String, anyhow::Error>(ServerError::validation("Invalid token").into())
            })
            .insert(echo(&terminal))
            .build()
            .unwrap();

    let err = pipeline
        .resolve((), json!({"email": "a@b.com"}), &request(Some("Bearer forged")), ())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ValidationFailed);
    assert_eq!(err.message, "Invalid token");
    assert_eq!(terminal.count(), 0);
}
