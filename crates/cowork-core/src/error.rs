//! Error types for the tool runtime

use thiserror::Error;

/// Result type alias using the crate's error type
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level runtime error
#[derive(Error, Debug)]
pub enum Error {
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Path is outside the allowed directories: {0}")]
    PathOutsideSandbox(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Errors a tool handler can produce, mapped onto the runtime's error
/// taxonomy (ArgumentDecode, PolicyDenied, SubsystemUnavailable,
/// RemoteFailure, Fatal) rather than surfaced as raw Rust errors.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The call's `arguments` JSON failed to decode against the tool's schema.
    #[error("invalid arguments: {0}")]
    ArgumentDecode(String),

    /// A sandbox, consent, or other policy boundary rejected the call.
    #[error("policy denied: {0}")]
    PolicyDenied(String),

    /// A dependent subsystem (LSP server, shell, store) is not running or
    /// not configured for this call.
    #[error("subsystem unavailable: {0}")]
    SubsystemUnavailable(String),

    /// A remote peer (HTTP server, language server, OpenAPI backend)
    /// returned a failure after the call reached it.
    #[error("remote failure: {0}")]
    RemoteFailure(String),

    /// Tool not registered under the given name.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// Unrecoverable internal error; the caller should not retry as-is.
    #[error("fatal: {0}")]
    Fatal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// A short machine-readable tag for the error category, used in
    /// `ToolCallResult::meta` so callers can branch on failure kind
    /// without parsing the message text.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::ArgumentDecode(_) => "argument_decode",
            ToolError::PolicyDenied(_) => "policy_denied",
            ToolError::SubsystemUnavailable(_) => "subsystem_unavailable",
            ToolError::RemoteFailure(_) => "remote_failure",
            ToolError::NotFound(_) => "not_found",
            ToolError::Fatal(_) => "fatal",
            ToolError::Io(_) => "fatal",
        }
    }
}
