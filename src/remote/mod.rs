//! Access to the remote component directory.
//!
//! The engine, snapshot store and verifier only see the [`Directory`] trait;
//! [`http::HttpDirectory`] is the REST implementation used by the CLI.

pub mod http;

use serde_json::Value;

use crate::error::{MigrateError, Result};
use crate::model::Item;

/// Read and write operations against one remote service.
pub trait Directory {
    /// Succeeds when the project exists and the credential can see it.
    fn project_exists(&self, project: &str) -> Result<()>;

    /// All components of a project, in the order the service returns them.
    fn list(&self, project: &str) -> Result<Vec<Item>>;

    /// Create a component and return the record the service stored.
    fn create(&self, project: &str, name: &str, description: Option<&str>) -> Result<Item>;
}

/// Pull the human-readable cause out of an error response body.
///
/// Prefers `errorMessages[]`, then the `errors` field map (sorted by field),
/// and returns `None` when the body carries neither.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    let messages: Vec<&str> = value
        .get("errorMessages")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if !messages.is_empty() {
        return Some(messages.join("; "));
    }

    let errors = value.get("errors").and_then(Value::as_object)?;
    let mut fields: Vec<(&String, &Value)> = errors.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));
    let rendered: Vec<String> = fields
        .into_iter()
        .map(|(field, msg)| match msg.as_str() {
            Some(text) => format!("{field}: {text}"),
            None => format!("{field}: {msg}"),
        })
        .collect();
    if rendered.is_empty() {
        None
    } else {
        Some(rendered.join("; "))
    }
}

/// Map a non-success HTTP status to the error class the run policy acts on.
pub fn classify(status: u16, body: &str) -> MigrateError {
    let message = error_message(body).unwrap_or_else(|| format!("HTTP {status}"));
    match status {
        401 | 403 => MigrateError::Auth { status, message },
        404 => MigrateError::NotFound { status, message },
        400..=499 => MigrateError::Validation { status, message },
        _ => MigrateError::Transport {
            status: Some(status),
            message,
        },
    }
}
