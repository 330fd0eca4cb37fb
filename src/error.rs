use thiserror::Error;

pub type PricingResult<T> = Result<T, PricingError>;

/// Top-level error aggregation for the pricing core.
///
/// Each variant wraps a domain-specific sub-enum so call sites can match on
/// the kind of failure (validation, not-found, external, cache, calculation,
/// audit) without losing the fine-grained reason.
#[derive(Debug, Error)]
pub enum PricingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    External(#[from] ExternalError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Calculation(#[from] CalculationError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error("internal error [{correlation_id}]: {message}")]
    Internal {
        correlation_id: String,
        message: String,
    },

    /// Concurrency limit exceeded: rejected immediately rather than queued.
    #[error("too many in-flight calculations, rejecting request {correlation_id}")]
    Busy { correlation_id: String },
}

impl PricingError {
    /// Stable machine-readable code for the HTTP layer; never leaks internals.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(NotFoundError::Ticker(_)) => "TICKER_NOT_FOUND",
            Self::NotFound(NotFoundError::Client(_)) => "CLIENT_NOT_FOUND",
            Self::NotFound(NotFoundError::ClientInactive(_)) => "CLIENT_INACTIVE",
            Self::External(ExternalError::CircuitOpen { .. }) => "CIRCUIT_OPEN",
            Self::External(_) => "EXTERNAL_API_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Calculation(_) => "CALCULATION_ERROR",
            Self::Audit(_) => "AUDIT_PERSISTENCE_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
            Self::Busy { .. } => "BUSY",
        }
    }

    /// HTTP status the (out-of-scope) HTTP layer should surface for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(NotFoundError::Ticker(_)) => 404,
            Self::NotFound(NotFoundError::Client(_)) => 404,
            Self::NotFound(NotFoundError::ClientInactive(_)) => 403,
            // External/circuit failures are recovered locally via fallback and
            // should never reach this mapping in practice; 502 is the inert default.
            Self::External(_) => 502,
            Self::Cache(_) => 500,
            Self::Calculation(_) => 500,
            Self::Audit(_) => 200,
            Self::Internal { .. } => 500,
            Self::Busy { .. } => 503,
        }
    }
}

/// Errors raised while validating a `CalculationRequest` before any external call is made.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("field '{field}' failed constraint: {constraint}")]
    FieldConstraint { field: String, constraint: String },
}

impl ValidationError {
    pub fn field(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self::FieldConstraint {
            field: field.into(),
            constraint: constraint.into(),
        }
    }
}

/// Errors for missing or deactivated entities.
#[derive(Debug, Error)]
pub enum NotFoundError {
    #[error("ticker '{0}' is not registered")]
    Ticker(String),

    #[error("client '{0}' is not registered")]
    Client(String),

    #[error("client '{0}' is registered but inactive")]
    ClientInactive(String),
}

/// Failure classes for a single external provider call, and circuit-breaker state.
#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("provider '{provider}' timed out after {elapsed_ms}ms")]
    Timeout { provider: String, elapsed_ms: u64 },

    #[error("provider '{provider}' connection error: {reason}")]
    ConnectionError { provider: String, reason: String },

    #[error("provider '{provider}' returned client error {status}")]
    HttpClientError { provider: String, status: u16 },

    #[error("provider '{provider}' returned server error {status}")]
    HttpServerError { provider: String, status: u16 },

    #[error("provider '{provider}' returned a malformed response: {reason}")]
    MalformedResponse { provider: String, reason: String },

    #[error("circuit for provider '{provider}' is open")]
    CircuitOpen { provider: String },
}

impl ExternalError {
    /// Whether this failure class is eligible for bounded retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::ConnectionError { .. } | Self::HttpServerError { .. }
        )
    }

    pub fn provider(&self) -> &str {
        match self {
            Self::Timeout { provider, .. }
            | Self::ConnectionError { provider, .. }
            | Self::HttpClientError { provider, .. }
            | Self::HttpServerError { provider, .. }
            | Self::MalformedResponse { provider, .. }
            | Self::CircuitOpen { provider } => provider,
        }
    }
}

/// Errors surfaced by a cache backend. These are almost always recovered
/// internally (degrade tiered -> single) rather than propagated to callers.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend '{backend}' unavailable: {reason}")]
    BackendUnavailable { backend: String, reason: String },

    #[error("failed to (de)serialize cached value for key '{key}': {reason}")]
    Serialization { key: String, reason: String },
}

/// Indicates a violated arithmetic invariant; should be unreachable in practice.
#[derive(Debug, Error)]
pub enum CalculationError {
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

/// Errors from the audit subsystem. Never block the user-facing response.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to persist audit record {audit_id}: {reason}")]
    PersistenceFailed { audit_id: String, reason: String },

    #[error("audit record '{0}' not found")]
    RecordNotFound(String),
}
