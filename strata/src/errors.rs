use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for migration operations
///
/// The first group describes a malformed registry or an engine precondition
/// that does not hold. The second group wraps failures that come from the
/// collaborators the engine drives (record stores, transactions and the
/// migration actions themselves).
///
/// # Examples
///
/// ```rust,ignore
/// use strata::errors::{StrataError, ErrorKind, StrataResult};
///
/// fn example() -> StrataResult<()> {
///     Err(StrataError::new("No migration defined", ErrorKind::NoMigrationDefined))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Registry Errors
    /// A migration uses the reserved schema-init identifier
    ReservedIdentifier(String),
    /// Two migrations in the registry share an identifier
    DuplicateIdentifier(String),
    /// The registry is empty and no schema initializer is set
    NoMigrationDefined,
    /// A migration has an empty identifier
    MissingIdentifier,

    // Engine Errors
    /// The migration has no rollback action
    RollbackImpossible,
    /// No migration of the registry has been applied yet
    NoAppliedMigration,
    /// The target identifier is not part of the registry
    MigrationIdNotFound,
    /// The tracking storage holds an identifier unknown to the registry
    UnknownPastMigration,

    // Collaborator Errors
    /// Error from the record store backend
    StoreError,
    /// A migration, rollback or schema-init action failed
    ActionFailed,
    /// Error while beginning, committing or aborting a transaction
    TransactionError,
    /// Invalid engine or store configuration
    InvalidConfiguration,
    /// Generic IO error
    IOError,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ReservedIdentifier(id) => write!(f, "Reserved migration ID: \"{}\"", id),
            ErrorKind::DuplicateIdentifier(id) => write!(f, "Duplicated migration ID: \"{}\"", id),
            ErrorKind::NoMigrationDefined => write!(f, "No migration defined"),
            ErrorKind::MissingIdentifier => write!(f, "Missing migration ID"),
            ErrorKind::RollbackImpossible => write!(f, "Rollback impossible"),
            ErrorKind::NoAppliedMigration => write!(f, "No applied migration"),
            ErrorKind::MigrationIdNotFound => write!(f, "Migration ID not found"),
            ErrorKind::UnknownPastMigration => write!(f, "Unknown past migration"),
            ErrorKind::StoreError => write!(f, "Store error"),
            ErrorKind::ActionFailed => write!(f, "Action failed"),
            ErrorKind::TransactionError => write!(f, "Transaction error"),
            ErrorKind::InvalidConfiguration => write!(f, "Invalid configuration"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom strata error type.
///
/// `StrataError` carries a message, an [`ErrorKind`] and an optional cause.
/// Collaborator failures are usually wrapped with context using
/// [`StrataError::new_with_cause`], so the original error stays reachable
/// through [`Error::source`].
///
/// # Examples
///
/// ```rust,ignore
/// use strata::errors::{StrataError, ErrorKind};
///
/// let cause = StrataError::new("disk I/O error", ErrorKind::StoreError);
/// let err = StrataError::new_with_cause(
///     "Failed to record migration 201608301400",
///     ErrorKind::StoreError,
///     cause,
/// );
/// ```
#[derive(Clone)]
pub struct StrataError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<StrataError>>,
    backtrace: Arc<Backtrace>,
}

impl StrataError {
    /// Creates a new `StrataError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        StrataError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Creates a new `StrataError` chained to the error that caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: StrataError) -> Self {
        StrataError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&StrataError> {
        self.cause.as_deref()
    }

    /// Returns the kind of the innermost error of the cause chain.
    ///
    /// Useful when an action failure has been wrapped with engine context
    /// and the caller wants to match on what originally went wrong.
    pub fn root_kind(&self) -> &ErrorKind {
        match &self.cause {
            Some(cause) => cause.root_kind(),
            None => &self.error_kind,
        }
    }
}

impl Display for StrataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for StrataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace),
        }
    }
}

impl Error for StrataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for migration operations.
pub type StrataResult<T> = Result<T, StrataError>;

impl From<std::io::Error> for StrataError {
    fn from(err: std::io::Error) -> Self {
        StrataError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<String> for StrataError {
    fn from(msg: String) -> Self {
        StrataError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for StrataError {
    fn from(msg: &str) -> Self {
        StrataError::new(msg, ErrorKind::InternalError)
    }
}
