use tracing::info;

use crate::config::Settings;
use crate::conflict;
use crate::error::{MigrateError, Result};
use crate::model::{Phase, Snapshot};
use crate::output::{self, CheckSummary, Format};
use crate::remote::Directory;
use crate::remote::http::HttpDirectory;

/// Both projects must exist and be visible to the credential before anything
/// is captured. Any failure here is a precondition failure.
pub fn preflight(directory: &dyn Directory, source: &str, dest: &str) -> Result<()> {
    for project in [source, dest] {
        directory.project_exists(project).map_err(|e| {
            MigrateError::Precondition(format!("cannot access project {project}: {e}"))
        })?;
        info!(project, "project reachable");
    }
    Ok(())
}

/// Read-only preview: counts on both sides and the names that would collide.
pub fn inspect(directory: &dyn Directory, source: &str, dest: &str) -> Result<CheckSummary> {
    preflight(directory, source, dest)?;
    let source_snap = Snapshot::new(source, Phase::Source, directory.list(source)?);
    let dest_snap = Snapshot::new(dest, Phase::DestBefore, directory.list(dest)?);
    let conflicts = conflict::detect(&source_snap, &dest_snap);
    Ok(CheckSummary {
        source: source.to_string(),
        dest: dest.to_string(),
        source_count: source_snap.len(),
        dest_count: dest_snap.len(),
        conflicts: conflicts.iter().map(str::to_string).collect(),
    })
}

pub fn run(settings: &Settings, format: Format) -> Result<()> {
    let directory = HttpDirectory::new(&settings.url, &settings.token, settings.timeout)?;
    let summary = inspect(&directory, &settings.source, &settings.dest)?;
    output::print_check(&summary, format)
}
