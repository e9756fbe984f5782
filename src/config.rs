use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use serde::Deserialize;

use crate::error::{MigrateError, Result};

pub const DEFAULT_DELAY_MS: u64 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection and pacing settings shared by every command that talks to the
/// remote service. Each flag falls back to its environment variable, then to
/// the config file, then to a default.
#[derive(Args, Clone, Default)]
pub struct SettingsArgs {
    /// Base URL of the REST API (e.g. https://jira.example.com/rest/api/2)
    #[arg(long, env = "JIRA_URL")]
    pub url: Option<String>,
    /// Bearer token used for every request
    #[arg(long, env = "JIRA_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Project key to copy components from
    #[arg(long, env = "JIRA_SOURCE_PROJECT")]
    pub source: Option<String>,
    /// Project key to create components in
    #[arg(long, env = "JIRA_DEST_PROJECT")]
    pub dest: Option<String>,
    /// Pause after each create request, in milliseconds
    #[arg(long, env = "JIRA_MIGRATE_DELAY_MS")]
    pub delay_ms: Option<u64>,
    /// Directory that receives the per-run artifact directory
    #[arg(long, env = "JIRA_MIGRATE_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,
    /// Per-request timeout, in seconds
    #[arg(long, env = "JIRA_MIGRATE_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
    /// YAML file providing any of the settings above
    #[arg(long, env = "JIRA_MIGRATE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Shape of the YAML config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub dest: Option<String>,
    #[serde(default)]
    pub delay_ms: Option<u64>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            MigrateError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&raw)?)
    }
}

/// Fully resolved, validated settings.
#[derive(Clone)]
pub struct Settings {
    pub url: String,
    pub token: String,
    pub source: String,
    pub dest: String,
    /// Pause after each create attempt, as configured.
    pub delay_ms: u64,
    pub output_dir: PathBuf,
    pub timeout: Duration,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .field("dest", &self.dest)
            .field("delay_ms", &self.delay_ms)
            .field("output_dir", &self.output_dir)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Settings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Merge flags/env with the config file named by `--config`, if any.
    pub fn resolve(args: &SettingsArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    pub fn merge(args: &SettingsArgs, file: FileConfig) -> Result<Self> {
        let url = required("url", "--url / JIRA_URL", args.url.clone().or(file.url))?;
        let token = required("token", "--token / JIRA_TOKEN", args.token.clone().or(file.token))?;
        let source = required(
            "source project",
            "--source / JIRA_SOURCE_PROJECT",
            args.source.clone().or(file.source),
        )?;
        let dest = required(
            "destination project",
            "--dest / JIRA_DEST_PROJECT",
            args.dest.clone().or(file.dest),
        )?;

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(MigrateError::Precondition(format!(
                "url must start with http:// or https:// (got '{url}')"
            )));
        }
        validate_project_key(&source)?;
        validate_project_key(&dest)?;
        if source == dest {
            return Err(MigrateError::Precondition(format!(
                "source and destination are both '{source}'"
            )));
        }

        let delay_ms = args.delay_ms.or(file.delay_ms).unwrap_or(DEFAULT_DELAY_MS);
        let timeout_secs = args
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(MigrateError::Precondition(
                "timeout must be at least one second".into(),
            ));
        }
        let output_dir = args
            .output_dir
            .clone()
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            token,
            source,
            dest,
            delay_ms,
            output_dir,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn required(what: &str, hint: &str, value: Option<String>) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(MigrateError::Precondition(format!("missing {what} ({hint})"))),
    }
}

/// Project keys end up in URL paths; allow only ASCII alphanumerics and `_`.
pub fn validate_project_key(key: &str) -> Result<()> {
    if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(MigrateError::Precondition(format!("invalid project key '{key}'")))
    }
}
