use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for tether operations.
///
/// The kinds follow the failure taxonomy of the persistence layer: store
/// failures are reported with the kind the store chose, hook failures carry
/// [`ErrorKind::HookError`] unless the hook picked a more specific kind, and
/// scope/cursor lifecycle problems have kinds of their own.
///
/// # Examples
///
/// ```rust,ignore
/// use tether::errors::{TetherError, ErrorKind, TetherResult};
///
/// fn example() -> TetherResult<()> {
///     Err(TetherError::new("User is not active", ErrorKind::HookError))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Store errors - propagated verbatim from the document store
    /// No document matched the selector
    NotFound,
    /// A document with the same `_id` already exists
    UniqueConstraintViolation,
    /// Generic failure reported by the storage backend
    BackendError,
    /// The store could not be reached or the session could not be copied
    ConnectionError,
    /// Authentication against the store failed
    SecurityError,
    /// The store session has already been closed
    StoreAlreadyClosed,

    // Hook errors
    /// A lifecycle hook rejected the operation
    HookError,

    // Lifecycle errors
    /// The execution scope backing an operator has already ended
    ScopeEnded,
    /// Closing or advancing a server-side cursor failed
    CursorError,

    // Mapping and validation errors
    /// Error mapping an object to or from a document
    ObjectMappingError,
    /// Invalid configuration or argument value
    ValidationError,
    /// The operation is not valid in the current context
    InvalidOperation,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::UniqueConstraintViolation => write!(f, "Unique constraint violation"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::ConnectionError => write!(f, "Connection error"),
            ErrorKind::SecurityError => write!(f, "Security error"),
            ErrorKind::StoreAlreadyClosed => write!(f, "Store already closed"),
            ErrorKind::HookError => write!(f, "Hook error"),
            ErrorKind::ScopeEnded => write!(f, "Scope ended"),
            ErrorKind::CursorError => write!(f, "Cursor error"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom tether error type.
///
/// `TetherError` carries a message, an [`ErrorKind`], an optional cause and
/// the backtrace captured at construction time. Errors returned by hooks and
/// by the document store pass through the persistence layer untouched, so a
/// caller can match on the kind it produced itself.
///
/// # Examples
///
/// ```rust,ignore
/// use tether::errors::{TetherError, ErrorKind};
///
/// let err = TetherError::new("Document not found", ErrorKind::NotFound);
///
/// let cause = TetherError::new("Socket closed", ErrorKind::ConnectionError);
/// let err = TetherError::new_with_cause("Insert failed", ErrorKind::BackendError, cause);
/// ```
#[derive(Clone)]
pub struct TetherError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<TetherError>>,
    backtrace: Arc<Backtrace>,
}

impl TetherError {
    /// Creates a new `TetherError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        TetherError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Backtrace::new_unresolved()),
        }
    }

    /// Creates a new `TetherError` wrapping a cause.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: TetherError) -> Self {
        TetherError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Backtrace::new_unresolved()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&TetherError> {
        self.cause.as_deref()
    }

    /// Returns `true` if this error reports a missing document.
    pub fn is_not_found(&self) -> bool {
        self.error_kind == ErrorKind::NotFound
    }
}

impl Display for TetherError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for TetherError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{} ({})\nCaused by: {:?}", self.message, self.error_kind, cause),
            None => {
                let mut backtrace = (*self.backtrace).clone();
                backtrace.resolve();
                write!(f, "{} ({})\n{:?}", self.message, self.error_kind, backtrace)
            }
        }
    }
}

impl Error for TetherError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for tether operations.
pub type TetherResult<T> = Result<T, TetherError>;

impl From<std::num::TryFromIntError> for TetherError {
    fn from(err: std::num::TryFromIntError) -> Self {
        TetherError::new(
            &format!("Integer conversion error: {}", err),
            ErrorKind::ObjectMappingError,
        )
    }
}

impl From<std::convert::Infallible> for TetherError {
    fn from(err: std::convert::Infallible) -> Self {
        match err {}
    }
}

impl From<String> for TetherError {
    fn from(msg: String) -> Self {
        TetherError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for TetherError {
    fn from(msg: &str) -> Self {
        TetherError::new(msg, ErrorKind::InternalError)
    }
}
