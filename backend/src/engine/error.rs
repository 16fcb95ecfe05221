use common::model::mapping::MappingError;
use thiserror::Error;

/// Every way a generation, lookup or Class List operation can fail.
///
/// `Parse`, `NotFound` and `InvalidInput` are the caller's problem and leave
/// persisted state untouched. `InternalConsistency` is always a bug.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("parse error at byte {byte_offset}: {reason}")]
    Parse { reason: String, byte_offset: usize },

    #[error("no free identifier for `{candidate}` after {attempts} attempts")]
    CollisionExhausted { candidate: String, attempts: usize },

    #[error("{0} not found")]
    NotFound(String),

    #[error("internal consistency violation: {0}")]
    InternalConsistency(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("generation cancelled")]
    Cancelled,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl EngineError {
    pub fn parse(reason: impl Into<String>, byte_offset: usize) -> Self {
        EngineError::Parse {
            reason: reason.into(),
            byte_offset,
        }
    }

    /// Errors the caller can fix by changing the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::Parse { .. } | EngineError::NotFound(_) | EngineError::InvalidInput(_)
        )
    }
}

impl From<MappingError> for EngineError {
    fn from(err: MappingError) -> Self {
        EngineError::InternalConsistency(err.to_string())
    }
}
