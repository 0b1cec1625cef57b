use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrashSightError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid dataset json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("note content is empty")]
    EmptyNote,

    #[error("issue {0} is already closed")]
    AlreadyClosed(String),

    #[error("issue {0} not found")]
    IssueNotFound(String),
}

pub type Result<T> = std::result::Result<T, CrashSightError>;
