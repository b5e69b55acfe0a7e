use thiserror::Error;

/// Errors raised by the subtitle core and the external tool wrappers.
///
/// Malformed colors, short `Style:` lines and unknown style references are
/// not represented here: those fall back to defaults instead of failing.
#[derive(Error, Debug)]
pub enum SubtitleError {
    #[error("Malformed timestamp: {0:?}")]
    MalformedTimestamp(String),

    #[error("{tool} exited with {status}: {stderr}")]
    ExternalProcessFailure {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("{0} not found. Please install it and ensure it is in PATH.")]
    ToolNotFound(String),

    #[error("Transcript error: {0}")]
    Transcript(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SubtitleError>;
