use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::model::{Phase, Snapshot};
use crate::remote::Directory;
use crate::store::snapshots::SnapshotStore;

/// Observed growth of the destination compared with what the run created.
///
/// A mismatch is reported, never raised: other writers may touch the
/// destination while a run is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub dest_before: usize,
    pub dest_after: usize,
    pub delta: i64,
    pub migrated: usize,
    pub diverged: bool,
}

impl Verification {
    pub fn compute(dest_before: usize, dest_after: usize, migrated: usize) -> Self {
        let delta = dest_after as i64 - dest_before as i64;
        Self {
            dest_before,
            dest_after,
            delta,
            migrated,
            diverged: delta != migrated as i64,
        }
    }
}

/// Re-list the destination as the dest-after snapshot and reconcile counts.
pub fn verify(
    store: &SnapshotStore<'_>,
    directory: &dyn Directory,
    dest: &str,
    dest_before: usize,
    migrated: usize,
) -> Result<(Snapshot, Verification)> {
    let after = store.capture(directory, dest, Phase::DestAfter)?;
    let verification = Verification::compute(dest_before, after.len(), migrated);
    if verification.diverged {
        warn!(
            delta = verification.delta,
            migrated, "destination count changed by a different amount than migrated"
        );
    } else {
        info!(delta = verification.delta, "destination count matches migrated");
    }
    Ok((after, verification))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrateError;
    use crate::model::Item;
    use crate::store::run_dir::RunDir;
    use tempfile::tempdir;

    #[test]
    fn matching_delta() {
        let v = Verification::compute(3, 5, 2);
        assert_eq!(v.delta, 2);
        assert!(!v.diverged);
    }

    #[test]
    fn divergence_is_surfaced_not_fatal() {
        let v = Verification::compute(3, 7, 2);
        assert_eq!(v.delta, 4);
        assert!(v.diverged);

        // Someone deleted components concurrently.
        let v = Verification::compute(5, 4, 0);
        assert_eq!(v.delta, -1);
        assert!(v.diverged);
    }

    struct Fixed(usize);

    impl Directory for Fixed {
        fn project_exists(&self, _project: &str) -> Result<()> {
            Ok(())
        }

        fn list(&self, _project: &str) -> Result<Vec<Item>> {
            Ok((0..self.0)
                .map(|i| Item::new(i.to_string(), format!("c{i}"), None))
                .collect())
        }

        fn create(&self, _project: &str, _name: &str, _description: Option<&str>) -> Result<Item> {
            Err(MigrateError::Precondition("unused".into()))
        }
    }

    #[test]
    fn verify_captures_dest_after() {
        let dir = tempdir().unwrap();
        let run = RunDir::create(dir.path(), "r1").unwrap();
        let store = SnapshotStore::new(&run, true);

        let (after, v) = verify(&store, &Fixed(4), "DST", 1, 2).unwrap();
        assert_eq!(after.len(), 4);
        assert_eq!(after.phase, Phase::DestAfter);
        assert_eq!(v.delta, 3);
        assert!(v.diverged);
        assert!(run.exists(Phase::DestAfter.file_name()));
    }
}
