//! Session threaded through pipeline steps

/// Identity context a step receives
///
/// With an `auth` step configured and a token present the session is
/// `Authenticated`. Without an `auth` step the raw token is passed along
/// unchanged, and without a token the session is `Anonymous`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session<S> {
    Anonymous,
    Token(String),
    Authenticated(S),
}

impl<S> Default for Session<S> {
    fn default() -> Self {
        Session::Anonymous
    }
}

impl<S> Session<S> {
    /// The identity produced by the `auth` step, if any
    pub fn identity(&self) -> Option<&S> {
        match self {
            Session::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    /// The raw token when no `auth` step interpreted it
    pub fn token(&self) -> Option<&str> {
        match self {
            Session::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Session::Anonymous)
    }
}
