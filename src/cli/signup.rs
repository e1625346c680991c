//! Bundled signup pipeline backed by SQLite
//!
//! Accepts `{"email": ..., "name": ...}`, authenticates the caller with one of
//! the configured static tokens and inserts a row into `users`.

use crate::config::AuthConfig;
use crate::core::{BuildError, Pipeline, SerdeSchema, Session};
use crate::error::{Classifier, ServerError};
use anyhow::Result;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::fmt;
use std::sync::{Arc, LazyLock};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

#[derive(Debug, Clone, Deserialize)]
pub struct Signup {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Row about to be written
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub invited_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub invited_by: String,
    pub created: DateTime<Utc>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} (invited by {})", self.id, self.email, self.invited_by)
    }
}

pub type SignupPipeline = Pipeline<Signup, NewUser, String, User, ServerError>;

/// Create the `users` table if it is missing
pub async fn prepare(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            name TEXT,
            invited_by TEXT NOT NULL,
            created TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Build the signup pipeline
///
/// Requests without a known token stop at the check gate; duplicate emails
/// surface as `ALREADY_EXISTS`.
pub fn pipeline(pool: SqlitePool, auth: AuthConfig) -> Result<SignupPipeline, BuildError> {
    let schema = SerdeSchema::<Signup>::new()
        .rule("email", "must be an email address", |s| EMAIL.is_match(&s.email))
        .rule("name", "must not be blank", |s| {
            s.name.as_deref().map_or(true, |name| !name.trim().is_empty())
        });
    let tokens = Arc::new(auth);

    Pipeline::builder("signup", schema, Classifier::default().route(|e| e))
        .require_auth()
        .require_terminal()
        .auth(move |token: String| {
            let tokens = tokens.clone();
            async move {
                match tokens.user_for(&token) {
                    Some(user) => anyhow::Ok(user.to_string()),
                    None => Err(ServerError::validation("Unknown token").into()),
                }
            }
        })
        .check(|_input, session: Session<String>| async move {
            anyhow::Ok(session.identity().is_some())
        })
        .transform(|input: Signup, session: Session<String>| async move {
            anyhow::Ok(NewUser {
                email: input.email.trim().to_lowercase(),
                name: input.name.map(|name| name.trim().to_string()),
                invited_by: session.identity().cloned().unwrap_or_default(),
            })
        })
        .insert(move |user: NewUser, _session| {
            let pool = pool.clone();
            async move { insert(&pool, user).await }
        })
        .build()
}

async fn insert(pool: &SqlitePool, user: NewUser) -> Result<User> {
    let created = Utc::now();
    let result = sqlx::query(
        "INSERT INTO users (email, name, invited_by, created) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.invited_by)
    .bind(created.naive_utc())
    .execute(pool)
    .await?;

    Ok(User {
        id: result.last_insert_rowid(),
        email: user.email,
        name: user.name,
        invited_by: user.invited_by,
        created,
    })
}
