use tracing::info;

use crate::error::Result;
use crate::model::{Item, Phase, Snapshot};
use crate::remote::Directory;
use crate::store::run_dir::RunDir;

/// Records container listings into the run directory, one file per phase.
///
/// Items are written exactly as listed. With `backup` off, the
/// before-snapshots are kept in memory only.
pub struct SnapshotStore<'a> {
    run: &'a RunDir,
    backup: bool,
}

impl<'a> SnapshotStore<'a> {
    pub fn new(run: &'a RunDir, backup: bool) -> Self {
        Self { run, backup }
    }

    pub fn capture(&self, directory: &dyn Directory, container: &str, phase: Phase) -> Result<Snapshot> {
        let items = directory.list(container)?;
        info!(%phase, container, count = items.len(), "captured snapshot");
        let snapshot = Snapshot::new(container, phase, items);
        self.persist(&snapshot)?;
        Ok(snapshot)
    }

    fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.phase.is_backup() && !self.backup {
            return Ok(());
        }
        self.run.write_json(snapshot.phase.file_name(), &snapshot.items)
    }

    /// Load a persisted snapshot; `None` when that phase was never written.
    pub fn load(&self, container: &str, phase: Phase) -> Result<Option<Snapshot>> {
        if !self.run.exists(phase.file_name()) {
            return Ok(None);
        }
        let items: Vec<Item> = self.run.read_json(phase.file_name())?;
        Ok(Some(Snapshot::new(container, phase, items)))
    }
}
