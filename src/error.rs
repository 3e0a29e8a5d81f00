//! Error types for sql-persist.
//!
//! Every public operation either returns a value or exactly one `PersistError`.
//! Lifecycle and argument checks produce the first six variants before any
//! connection is touched; everything the driver reports is folded into
//! `DataAccess`, so `sqlx::Error` never reaches the caller.

use thiserror::Error;

/// The category of a `PersistError`, independent of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NullArgument,
    InvalidArgument,
    InvalidState,
    InvalidStatementType,
    NoResult,
    NonUniqueResult,
    DataAccess,
}

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Missing argument: {message}")]
    NullArgument { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Incorrect statement type: {message}")]
    InvalidStatementType { message: String },

    #[error("No result: {message}")]
    NoResult { message: String },

    #[error("Non-unique result: {message}")]
    NonUniqueResult { message: String },

    #[error("Data access error: {message}")]
    DataAccess {
        message: String,
        /// e.g., "23000" for an integrity constraint violation
        sql_state: Option<String>,
        suggestion: String,
    },
}

impl PersistError {
    /// Create a missing-argument error.
    pub fn null_argument(message: impl Into<String>) -> Self {
        Self::NullArgument {
            message: message.into(),
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a lifecycle violation error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create an incorrect statement type error.
    pub fn invalid_statement_type(message: impl Into<String>) -> Self {
        Self::InvalidStatementType {
            message: message.into(),
        }
    }

    /// Create a no-result error.
    pub fn no_result(message: impl Into<String>) -> Self {
        Self::NoResult {
            message: message.into(),
        }
    }

    /// Create a non-unique result error.
    pub fn non_unique_result(message: impl Into<String>) -> Self {
        Self::NonUniqueResult {
            message: message.into(),
        }
    }

    /// Create a data access error with optional SQL state.
    pub fn data_access(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::DataAccess {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    /// Create a data access error for a failed row-to-entity conversion.
    pub fn materialization(entity: &str, cause: impl std::fmt::Display) -> Self {
        Self::data_access(
            format!("Failed to materialize {}: {}", entity, cause),
            None,
            "Check that the entity's from_row matches the selected columns",
        )
    }

    /// Create a data access error for an execution that exceeded its timeout.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u64) -> Self {
        Self::data_access(
            format!("{} exceeded {}s", operation.into(), elapsed_secs),
            None,
            "Consider increasing query_timeout or optimizing the statement",
        )
    }

    /// Get the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NullArgument { .. } => ErrorKind::NullArgument,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::InvalidStatementType { .. } => ErrorKind::InvalidStatementType,
            Self::NoResult { .. } => ErrorKind::NoResult,
            Self::NonUniqueResult { .. } => ErrorKind::NonUniqueResult,
            Self::DataAccess { .. } => ErrorKind::DataAccess,
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::DataAccess { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Get the SQLSTATE code reported by the driver, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::DataAccess { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }
}

/// Convert sqlx errors to PersistError.
impl From<sqlx::Error> for PersistError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => PersistError::data_access(
                msg.to_string(),
                None,
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                PersistError::data_access(
                    db_err.message(),
                    code,
                    "Check the SQL syntax and referenced objects",
                )
            }
            sqlx::Error::PoolTimedOut => PersistError::data_access(
                "Timed out acquiring a connection from the pool",
                None,
                "Increase acquire_timeout or max_connections",
            ),
            sqlx::Error::PoolClosed => PersistError::data_access(
                "Connection pool is closed",
                None,
                "Create a new data source",
            ),
            sqlx::Error::Io(io_err) => PersistError::data_access(
                format!("I/O error: {}", io_err),
                None,
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => PersistError::data_access(
                format!("TLS error: {}", tls_err),
                None,
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => PersistError::data_access(
                format!("Protocol error: {}", msg),
                None,
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => PersistError::data_access(
                format!("Column not found: {}", col),
                None,
                "Check the selected column names",
            ),
            sqlx::Error::ColumnDecode { index, source } => PersistError::data_access(
                format!("Failed to decode column {}: {}", index, source),
                None,
                "Check the column's declared type",
            ),
            sqlx::Error::Decode(source) => PersistError::data_access(
                format!("Decode error: {}", source),
                None,
                "Check the column's declared type",
            ),
            sqlx::Error::WorkerCrashed => PersistError::data_access(
                "Database worker crashed",
                None,
                "Reconnect to the database",
            ),
            _ => PersistError::data_access(
                format!("Unknown database error: {}", err),
                None,
                "Inspect the driver error message",
            ),
        }
    }
}

/// Result type alias for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PersistError::invalid_state("Transaction already active.");
        assert_eq!(
            err.to_string(),
            "Invalid state: Transaction already active."
        );
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            PersistError::null_argument("sql").kind(),
            ErrorKind::NullArgument
        );
        assert_eq!(
            PersistError::invalid_statement_type("SELECT").kind(),
            ErrorKind::InvalidStatementType
        );
        assert_eq!(PersistError::timeout("query", 30).kind(), ErrorKind::DataAccess);
    }

    #[test]
    fn test_error_suggestion() {
        let err = PersistError::data_access(
            "UNIQUE constraint failed",
            Some("2067".to_string()),
            "Check the SQL syntax",
        );
        assert_eq!(err.suggestion(), Some("Check the SQL syntax"));
        assert_eq!(err.sql_state(), Some("2067"));
        assert_eq!(PersistError::no_result("empty").suggestion(), None);
    }

    #[test]
    fn test_materialization_names_entity() {
        let err = PersistError::materialization("Account", "missing column NAME");
        assert_eq!(err.kind(), ErrorKind::DataAccess);
        assert!(err.to_string().contains("Account"));
        assert!(err.to_string().contains("NAME"));
    }

    #[test]
    fn test_pool_timeout_maps_to_data_access() {
        let err: PersistError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.kind(), ErrorKind::DataAccess);
    }
}
