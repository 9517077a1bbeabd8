use thiserror::Error;

/// Errors raised while invoking an agent or consuming its event stream.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent does not support blocking calls")]
    Unsupported,

    #[error("failed to start agent: {0}")]
    Spawn(String),

    #[error("agent I/O error: {0}")]
    Io(String),

    #[error("agent exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("stream error: {0}")]
    Stream(String),

    #[error("agent task failed: {0}")]
    Join(String),

    #[error("agent call was cancelled")]
    Cancelled,
}

impl From<std::io::Error> for AgentError {
    fn from(err: std::io::Error) -> Self {
        AgentError::Io(err.to_string())
    }
}

/// Errors from a format post-processor.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("token decoding failed: {0}")]
    Decode(String),

    #[error("malformed response: {0}")]
    Invalid(String),
}

/// Errors from the conversation persistence hook.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("conversation I/O error: {0}")]
    Io(String),

    #[error("failed to serialize conversation: {0}")]
    Serialize(String),
}

impl From<std::io::Error> for PersistError {
    fn from(err: std::io::Error) -> Self {
        PersistError::Io(err.to_string())
    }
}

/// Errors from reading or parsing `config.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(String),

    #[error("invalid config: {0}")]
    Parse(String),
}
