use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("authentication rejected (HTTP {status}): {message}")]
    Auth { status: u16, message: String },

    #[error("not found (HTTP {status}): {message}")]
    NotFound { status: u16, message: String },

    #[error("request rejected (HTTP {status}): {message}")]
    Validation { status: u16, message: String },

    #[error("transport failure{}: {message}", fmt_status(.status))]
    Transport { status: Option<u16>, message: String },

    #[error("unexpected response from remote service: {0}")]
    InvalidResponse(String),

    #[error("locked by another process: {0}")]
    Locked(String),

    #[error("run artifact '{0}' is missing")]
    MissingArtifact(String),

    #[error("run artifact '{0}' is malformed: {1}")]
    InvalidArtifact(String, String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl MigrateError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Precondition(_) => "precondition",
            Self::Auth { .. } => "auth",
            Self::NotFound { .. } => "not_found",
            Self::Validation { .. } => "validation",
            Self::Transport { .. } => "transport",
            Self::InvalidResponse(_) => "invalid_response",
            Self::Locked(_) => "locked",
            Self::MissingArtifact(_) => "missing_artifact",
            Self::InvalidArtifact(_, _) => "invalid_artifact",
            Self::Config(_) => "config",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
            Self::Yaml(_) => "yaml_error",
        }
    }

    /// HTTP status carried by a remote failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. }
            | Self::NotFound { status, .. }
            | Self::Validation { status, .. } => Some(*status),
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Human-readable cause for an outcome row: the remote payload message
    /// for service errors, the display text for everything else.
    pub fn remote_message(&self) -> String {
        match self {
            Self::Auth { message, .. }
            | Self::NotFound { message, .. }
            | Self::Validation { message, .. }
            | Self::Transport { message, .. } => message.clone(),
            Self::InvalidResponse(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;
