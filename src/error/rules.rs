//! Backend-specific error rules
//!
//! Each storage backend reports uniqueness violations differently. The
//! embedded engine exposes a structured extended result code and names the
//! offending column in its message; client/server engines only carry a free
//! text `detail` plus the violated constraint's name.

use crate::error::{ErrorRule, ServerError};
use std::error::Error as StdError;
use std::marker::PhantomData;
use tracing::warn;

/// Constraint-name suffixes that mark a uniqueness constraint
pub const UNIQUE_SUFFIXES: &[&str] = &["_unique", "_key", "_pkey"];

/// A database error that carries a `detail` field and a constraint name
pub trait ConstraintDetail: StdError + Send + Sync + 'static {
    fn detail(&self) -> Option<&str>;

    fn constraint(&self) -> Option<&str>;

    /// Find an error of this type inside `error`
    fn locate(error: &anyhow::Error) -> Option<&Self>
    where
        Self: Sized,
    {
        error.chain().find_map(|cause| cause.downcast_ref::<Self>())
    }
}

/// Recognizes relational-engine errors that carry a `detail` field
///
/// A constraint name ending in one of the configured suffixes becomes
/// `ALREADY_EXISTS` with `at` set to the constraint stem after its first `_`
/// (`users_email_unique` -> `email`). Any other detail-bearing error is an
/// internal error.
pub struct DetailConstraintRule<E> {
    suffixes: Vec<String>,
    _error: PhantomData<fn() -> E>,
}

impl<E: ConstraintDetail> DetailConstraintRule<E> {
    pub fn new() -> Self {
        Self::with_suffixes(UNIQUE_SUFFIXES.iter().copied())
    }

    pub fn with_suffixes<I, T>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
            _error: PhantomData,
        }
    }

    /// Field named by a uniqueness constraint, if `constraint` is one
    pub fn unique_field(&self, constraint: &str) -> Option<String> {
        let stem = self
            .suffixes
            .iter()
            .find_map(|suffix| constraint.strip_suffix(suffix.as_str()))?;
        let field = match stem.split_once('_') {
            Some((_, rest)) if !rest.is_empty() => rest,
            _ => stem,
        };
        Some(field.to_string())
    }
}

impl<E: ConstraintDetail> Default for DetailConstraintRule<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ConstraintDetail> ErrorRule for DetailConstraintRule<E> {
    fn name(&self) -> &'static str {
        std::any::type_name::<E>()
    }

    fn classify(&self, error: &anyhow::Error) -> Option<ServerError> {
        let db_error = E::locate(error)?;
        let detail = db_error.detail()?;

        match db_error.constraint().and_then(|c| self.unique_field(c)) {
            Some(field) => Some(ServerError::already_exists(detail, vec![field])),
            None => {
                warn!("Database error without a uniqueness constraint: {}", detail);
                Some(ServerError::internal("Unexpected database error"))
            }
        }
    }
}

#[cfg(feature = "postgres")]
impl ConstraintDetail for sqlx::postgres::PgDatabaseError {
    fn detail(&self) -> Option<&str> {
        sqlx::postgres::PgDatabaseError::detail(self)
    }

    fn constraint(&self) -> Option<&str> {
        sqlx::postgres::PgDatabaseError::constraint(self)
    }

    /// Found either wrapped in a `sqlx::Error` or on its own in the chain
    fn locate(error: &anyhow::Error) -> Option<&Self> {
        error.chain().find_map(|cause| {
            cause.downcast_ref::<Self>().or_else(|| {
                cause
                    .downcast_ref::<sqlx::Error>()
                    .and_then(sqlx::Error::as_database_error)
                    .and_then(|db_error| db_error.try_downcast_ref::<Self>())
            })
        })
    }
}

#[cfg(feature = "sqlite")]
pub use self::sqlite::SqliteUniqueRule;

#[cfg(feature = "sqlite")]
mod sqlite {
    use crate::error::{ErrorRule, ServerError};
    use sqlx::error::DatabaseError;
    use sqlx::sqlite::SqliteError;

    const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";
    const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";

    /// Recognizes SQLite uniqueness violations raised through sqlx
    ///
    /// The message ends with the offending `table.column`, which becomes `at`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SqliteUniqueRule;

    impl ErrorRule for SqliteUniqueRule {
        fn name(&self) -> &'static str {
            "sqlite"
        }

        fn classify(&self, error: &anyhow::Error) -> Option<ServerError> {
            let db_error = error
                .chain()
                .find_map(|cause| cause.downcast_ref::<sqlx::Error>())
                .and_then(sqlx::Error::as_database_error)?
                .try_downcast_ref::<SqliteError>()?;

            let code = db_error.code()?;
            if code != SQLITE_CONSTRAINT_UNIQUE && code != SQLITE_CONSTRAINT_PRIMARYKEY {
                return None;
            }

            let message = db_error.message();
            let column = message.rsplit(' ').next().unwrap_or(message);
            let at = column.split('.').map(str::to_string).collect();
            Some(ServerError::already_exists(message, at))
        }
    }

}
