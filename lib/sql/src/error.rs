use thiserror::Error;

#[derive(Error, Debug)]
pub enum SQLError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("connection error: {0}")]
    Connection(String),

    /// A guarded statement inside `exec_tx` affected zero rows; the whole
    /// transaction was rolled back.
    #[error("guard failed: {0}")]
    GuardFailed(String),
}

impl SQLError {
    /// Whether this error came from a UNIQUE constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            SQLError::Execution(msg) | SQLError::Query(msg) => {
                msg.contains("UNIQUE constraint")
            }
            _ => false,
        }
    }
}
