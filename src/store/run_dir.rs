use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::conflict::ConflictSet;
use crate::error::{MigrateError, Result};
use crate::model::{Outcome, RunMeta};
use crate::store::lock;

pub const RUN_META: &str = "run.json";
pub const CONFLICTS: &str = "conflicts.txt";
pub const OUTCOMES: &str = "outcomes.json";
pub const MIGRATION_LOG: &str = "migration_log.txt";
pub const MAPPING: &str = "component_mapping.csv";
pub const SUMMARY: &str = "summary.json";
pub const VERIFY_ERROR: &str = "verification_error.txt";
const LOCK: &str = "run.lock";

/// Timestamp id used to name a run directory, e.g. `20250301_142210`.
pub fn run_id(at: DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// One run's artifact directory, locked for the lifetime of this value.
///
/// On-disk layout under `component_migration_<run_id>/`:
///   - `run.json`                      run metadata
///   - `source_components.json`        source snapshot
///   - `dest_components_before.json`   destination before migration
///   - `dest_components_after.json`    destination after migration
///   - `conflicts.txt`                 colliding names, one per line
///   - `outcomes.json`                 outcome sequence
///   - `migration_log.txt`             `status|name|source_id|detail_or_dest_id`
///   - `component_mapping.csv`         name -> id mapping
///   - `summary.json`                  structured report
///   - `verification_error.txt`        why the dest-after listing failed, if it did
#[derive(Debug)]
pub struct RunDir {
    path: PathBuf,
    _lock: File,
}

impl RunDir {
    /// Create a fresh run directory under `output_root`. Never reuses one.
    pub fn create(output_root: &Path, run_id: &str) -> Result<Self> {
        let path = output_root.join(format!("component_migration_{run_id}"));
        if path.exists() {
            return Err(MigrateError::Precondition(format!(
                "run directory {} already exists",
                path.display()
            )));
        }
        fs::create_dir_all(&path)?;
        let lock = lock::acquire(&path.join(LOCK))?;
        Ok(Self { path, _lock: lock })
    }

    /// Open an existing run directory for regenerating derived artifacts.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.join(RUN_META).exists() {
            return Err(MigrateError::MissingArtifact(
                path.join(RUN_META).display().to_string(),
            ));
        }
        let lock = lock::acquire(&path.join(LOCK))?;
        Ok(Self {
            path: path.to_path_buf(),
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.file(name).exists()
    }

    pub fn write_text(&self, name: &str, text: &str) -> Result<()> {
        fs::write(self.file(name), text)?;
        Ok(())
    }

    pub fn read_text(&self, name: &str) -> Result<String> {
        let path = self.file(name);
        if !path.exists() {
            return Err(MigrateError::MissingArtifact(name.to_string()));
        }
        Ok(fs::read_to_string(path)?)
    }

    /// Pretty JSON with a trailing newline.
    pub fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let mut json = serde_json::to_string_pretty(value)?;
        json.push('\n');
        self.write_text(name, &json)
    }

    pub fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let text = self.read_text(name)?;
        serde_json::from_str(&text)
            .map_err(|e| MigrateError::InvalidArtifact(name.to_string(), e.to_string()))
    }

    /// Append one line, creating the file on first use.
    pub fn append_line(&self, name: &str, line: &str) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file(name))?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_meta(&self, meta: &RunMeta) -> Result<()> {
        self.write_json(RUN_META, meta)
    }

    pub fn read_meta(&self) -> Result<RunMeta> {
        self.read_json(RUN_META)
    }

    pub fn write_conflicts(&self, conflicts: &ConflictSet) -> Result<()> {
        self.write_text(CONFLICTS, &conflicts.render())
    }

    pub fn write_outcomes(&self, outcomes: &[Outcome]) -> Result<()> {
        self.write_json(OUTCOMES, outcomes)
    }

    pub fn read_outcomes(&self) -> Result<Vec<Outcome>> {
        self.read_json(OUTCOMES)
    }
}
