use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A component as listed by the remote service.
///
/// Fields the service returns beyond `id`, `name` and `description` are kept
/// in `extra` so a persisted snapshot records everything that was read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description,
            extra: Map::new(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Which point of the run a snapshot was taken at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Source,
    DestBefore,
    DestAfter,
}

impl Phase {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Source => "source_components.json",
            Self::DestBefore => "dest_components_before.json",
            Self::DestAfter => "dest_components_after.json",
        }
    }

    /// Before-snapshots are the run's backup and may be left off disk.
    pub fn is_backup(self) -> bool {
        matches!(self, Self::Source | Self::DestBefore)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::DestBefore => write!(f, "dest-before"),
            Self::DestAfter => write!(f, "dest-after"),
        }
    }
}

/// Items of one container at one instant, in the order the service listed them.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub container: String,
    pub phase: Phase,
    pub items: Vec<Item>,
}

impl Snapshot {
    pub fn new(container: impl Into<String>, phase: Phase, items: Vec<Item>) -> Self {
        Self {
            container: container.into(),
            phase,
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.name.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Migrated,
    Skipped,
    Failed,
    DryRun,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Migrated => write!(f, "migrated"),
            Self::Skipped => write!(f, "skipped"),
            Self::Failed => write!(f, "failed"),
            Self::DryRun => write!(f, "dry_run"),
        }
    }
}

/// Result of processing one source item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Outcome {
    pub name: String,
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_id: Option<String>,
    pub status: Status,
    pub detail: String,
}

impl Outcome {
    pub fn mapping_row(&self) -> MappingRow {
        MappingRow {
            name: self.name.clone(),
            source_id: self.source_id.clone(),
            dest_id: self.dest_id.clone(),
            status: self.status,
        }
    }
}

/// One line of the name -> identifier mapping handed to later migrations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MappingRow {
    pub name: String,
    pub source_id: String,
    pub dest_id: Option<String>,
    pub status: Status,
}

/// Tallies derived from an outcome sequence. Never incremented in place.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Counts {
    pub total: usize,
    pub migrated: usize,
    pub failed: usize,
    pub skipped: usize,
    pub dry_run: usize,
}

impl Counts {
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        let count = |status: Status| outcomes.iter().filter(|o| o.status == status).count();
        Self {
            total: outcomes.len(),
            migrated: count(Status::Migrated),
            failed: count(Status::Failed),
            skipped: count(Status::Skipped),
            dry_run: count(Status::DryRun),
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.total == self.migrated + self.failed + self.skipped + self.dry_run
    }
}

/// Run-level facts recorded in `run.json` before any write is attempted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunMeta {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub url: String,
    pub source: String,
    pub dest: String,
    pub dry_run: bool,
    pub delay_ms: u64,
    pub backup: bool,
    pub source_count: usize,
    pub dest_before_count: usize,
    pub conflict_count: usize,
    pub tool_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_sha: Option<String>,
}
