use std::path::PathBuf;

/// Failures at the external media tool boundary
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("encoder `{program}` is not available: {reason}")]
    EncoderUnavailable { program: String, reason: String },

    #[error("encoding {} failed: {stderr}", .input.display())]
    EncodeFailed { input: PathBuf, stderr: String },

    #[error("probe failed for {}: {reason}", .path.display())]
    ProbeFailed { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ToolResult<T> = std::result::Result<T, ToolError>;
