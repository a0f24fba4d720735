use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Schema '{0}' cannot be mapped: {1}")]
    SchemaError(String, String),

    #[error("Member '{0}' not found in schema '{1}'")]
    MemberNotFound(String, String),

    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Identity unavailable: {0}")]
    IdentityUnavailable(String),

    #[error("Schema synchronization failed for '{schema}': {source}")]
    SynchronizationFailed {
        schema: String,
        #[source]
        source: Box<DbError>,
    },

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Statement timed out: {0}")]
    Timeout(String),

    #[error("Codec error: {0}")]
    CodecError(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl DbError {
    /// True for failures raised by the statement executor itself.
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, Self::ExecutionError(_) | Self::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        Self::CodecError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synchronization_failure_keeps_executor_error_as_source() {
        let err = DbError::SynchronizationFailed {
            schema: "Customer".into(),
            source: Box::new(DbError::Timeout("create table".into())),
        };

        assert!(err.to_string().contains("Customer"));
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("timed out"));
    }

    #[test]
    fn serde_errors_become_codec_errors() {
        let err: DbError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, DbError::CodecError(_)));
    }
}
