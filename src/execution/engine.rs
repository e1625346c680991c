//! Pipeline execution - the direct and resolver entry points

use crate::{
    core::{Gate, Outcome, Pipeline, Session},
    error::ServerError,
    execution::request::{bearer_token, RequestContext},
};
use serde_json::Value;
use tracing::{debug, warn};

impl<T, P, S, R, E> Pipeline<T, P, S, R, E>
where
    T: Clone + Send + 'static,
    P: Send + 'static,
    S: Clone + Send + 'static,
    R: Send + 'static,
{
    /// Direct entry point
    ///
    /// A token is authenticated when an `auth` step is configured; a missing
    /// token is not an error here. Every failure is handed to the pipeline's
    /// error handler.
    pub async fn run(&self, raw: Value, token: Option<&str>) -> Result<Outcome<R>, E> {
        debug!("Running pipeline {}", self.name);
        self.execute(&raw, token.map(str::to_owned)).await
    }

    /// Resolver entry point, shaped like a schema-driven API field resolver
    ///
    /// Skipped and guarded outcomes both resolve to `None`.
    pub async fn resolve<Parent, C, Info>(
        &self,
        _parent: Parent,
        args: Value,
        context: &C,
        _info: Info,
    ) -> Result<Option<R>, E>
    where
        C: RequestContext + ?Sized,
    {
        self.resolve_outcome(args, context).await.map(Outcome::into_option)
    }

    /// Resolver entry point returning the full [`Outcome`]
    ///
    /// With `require_auth`, a missing or malformed `Authorization: Bearer`
    /// header fails before any step runs.
    pub async fn resolve_outcome<C>(&self, args: Value, context: &C) -> Result<Outcome<R>, E>
    where
        C: RequestContext + ?Sized,
    {
        debug!("Resolving pipeline {}", self.name);
        let token = bearer_token(context);
        if self.auth_required && token.is_none() {
            warn!("Pipeline {} rejected a request without bearer token", self.name);
            let error = ServerError::validation("Authorization header is not provided");
            return Err((self.on_error)(error.into()));
        }
        self.execute(&args, token).await
    }

    async fn execute(&self, raw: &Value, token: Option<String>) -> Result<Outcome<R>, E> {
        match self.steps(raw, token).await {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                warn!("Pipeline {} failed: {:#}", self.name, error);
                Err((self.on_error)(error))
            }
        }
    }

    async fn steps(&self, raw: &Value, token: Option<String>) -> anyhow::Result<Outcome<R>> {
        let input = self.input.parse(raw)?;

        let session = match (&self.auth, token) {
            (Some(auth), Some(token)) => Session::Authenticated(auth(token).await?),
            (None, Some(token)) => Session::Token(token),
            (_, None) => Session::Anonymous,
        };

        if let Some(existence) = &self.existence {
            if !existence(input.clone(), session.clone()).await? {
                debug!("Pipeline {} stopped at {} gate", self.name, Gate::Existence);
                return Ok(Outcome::Skipped(Gate::Existence));
            }
        }

        if let Some(check) = &self.check {
            if !check(input.clone(), session.clone()).await? {
                debug!("Pipeline {} stopped at {} gate", self.name, Gate::Check);
                return Ok(Outcome::Skipped(Gate::Check));
            }
        }

        let refined = (self.transform)(input, session.clone()).await?;

        match &self.terminal {
            Some(terminal) => {
                debug!("Pipeline {} running {} operation", self.name, terminal.kind());
                let result = terminal.execute(refined, session).await?;
                Ok(Outcome::Completed(result))
            }
            None => Ok(Outcome::Guarded),
        }
    }
}
