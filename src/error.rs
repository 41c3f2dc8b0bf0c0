use thiserror::Error;

/// Every failure the calculator can report to its caller.
///
/// Validation errors (`InvalidOperand`, `MissingOperand`, ...) are raised before
/// any request leaves the process; `Http`, `Backend` and `MalformedResponse`
/// come back from the remote endpoint.
#[derive(Debug, Error)]
pub enum CalcError {
    #[error("invalid operand '{0}'")]
    InvalidOperand(String),

    #[error("no operand entered and no previous result to continue from")]
    MissingOperand,

    #[error("{0} is not an integer")]
    NotAnInteger(String),

    #[error("invalid matrix: {0}")]
    InvalidMatrix(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("history has no entry {0}")]
    NoSuchEntry(usize),

    #[error("history entry {0} holds a matrix and cannot be chained")]
    NotScalar(usize),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[cfg(feature = "web")]
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no free port in {start}..{end}")]
    NoFreePort { start: u16, end: u32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
