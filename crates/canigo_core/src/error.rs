use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure classification. Each kind maps to exactly one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
pub enum ErrorKind {
    /// No token, bad/expired token, stale token, or vanished identity.
    #[strum(serialize = "unauthenticated")]
    Unauthenticated,
    /// Authenticated, but the role or ownership check failed.
    #[strum(serialize = "forbidden")]
    Forbidden,
    #[strum(serialize = "not found")]
    NotFound,
    /// Unique constraint violated (email, address, pass level name).
    #[strum(serialize = "conflict")]
    Conflict,
    #[strum(serialize = "invalid input")]
    InvalidInput,
    /// Outbound email could not be delivered.
    #[strum(serialize = "delivery failed")]
    Delivery,
    /// Underlying persistence failure. Never retried by the core.
    #[strum(serialize = "store error")]
    Store,
    /// Anything else that is our fault (token signing, hashing).
    #[strum(serialize = "internal")]
    Internal,
}

impl ErrorKind {
    pub fn http_status(self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::InvalidInput => 400,
            Self::Delivery => 502,
            Self::Store => 500,
            Self::Internal => 500,
        }
    }
}

/// The single error value used across the workspace.
///
/// Always built through [`CanigoError::new`]; the kind comes first, the
/// human-readable message second, and an optional cause is attached with
/// [`CanigoError::with_cause`].
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct CanigoError {
    kind: ErrorKind,
    message: String,
    #[source]
    cause: Option<BoxError>,
}

impl CanigoError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthenticated, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn delivery(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Delivery, message)
    }

    pub fn store(cause: impl Into<BoxError>) -> Self {
        Self::new(ErrorKind::Store, "persistence failure").with_cause(cause)
    }

    pub fn internal(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::new(ErrorKind::Internal, message).with_cause(cause)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }
}

impl From<anyhow::Error> for CanigoError {
    fn from(err: anyhow::Error) -> Self {
        Self::store(err)
    }
}
