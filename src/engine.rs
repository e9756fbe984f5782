use std::time::Duration;

use tracing::{debug, warn};

use crate::conflict::ConflictSet;
use crate::error::Result;
use crate::model::{Counts, Item, Outcome, Snapshot, Status};
use crate::remote::Directory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationOptions {
    pub dry_run: bool,
    /// Pause after every create attempt, successful or not.
    pub delay: Duration,
}

/// Waits between remote writes.
pub trait Pacer {
    fn pause(&mut self, delay: Duration);
}

pub struct ThreadSleep;

impl Pacer for ThreadSleep {
    fn pause(&mut self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

/// What the engine reports while it works.
#[derive(Debug)]
pub enum Event<'a> {
    Started { total: usize, conflicts: usize, dry_run: bool },
    Recorded { position: usize, total: usize, outcome: &'a Outcome },
    Finished { counts: &'a Counts },
}

/// Side-effecting listener: console progress, the incremental log file.
pub trait Observer {
    fn notify(&mut self, event: &Event<'_>) -> Result<()>;
}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn notify(&mut self, event: &Event<'_>) -> Result<()> {
        (**self).notify(event)
    }
}

/// Delivers each event to the first observer, then the second.
pub struct Tee<A, B>(pub A, pub B);

impl<A: Observer, B: Observer> Observer for Tee<A, B> {
    fn notify(&mut self, event: &Event<'_>) -> Result<()> {
        self.0.notify(event)?;
        self.1.notify(event)
    }
}

/// Ignores every event.
pub struct Silent;

impl Observer for Silent {
    fn notify(&mut self, _event: &Event<'_>) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationResult {
    pub outcomes: Vec<Outcome>,
    pub counts: Counts,
}

pub struct Engine<'a> {
    directory: &'a dyn Directory,
    options: MigrationOptions,
}

impl<'a> Engine<'a> {
    pub fn new(directory: &'a dyn Directory, options: MigrationOptions) -> Self {
        Self { directory, options }
    }

    /// Walk the source snapshot in listed order and settle every item.
    ///
    /// Create failures are recorded and the walk continues; only an observer
    /// error stops it early.
    pub fn run(
        &self,
        source: &Snapshot,
        dest: &str,
        conflicts: &ConflictSet,
        pacer: &mut dyn Pacer,
        observer: &mut dyn Observer,
    ) -> Result<MigrationResult> {
        let total = source.len();
        observer.notify(&Event::Started {
            total,
            conflicts: conflicts.len(),
            dry_run: self.options.dry_run,
        })?;

        let mut outcomes: Vec<Outcome> = Vec::with_capacity(total);
        for (position, item) in source.items.iter().enumerate() {
            outcomes.push(self.settle(item, dest, conflicts, pacer));
            observer.notify(&Event::Recorded {
                position: position + 1,
                total,
                outcome: &outcomes[position],
            })?;
        }

        let counts = Counts::from_outcomes(&outcomes);
        observer.notify(&Event::Finished { counts: &counts })?;
        Ok(MigrationResult { outcomes, counts })
    }

    fn settle(&self, item: &Item, dest: &str, conflicts: &ConflictSet, pacer: &mut dyn Pacer) -> Outcome {
        let pending = |status: Status, dest_id: Option<String>, detail: String| Outcome {
            name: item.name.clone(),
            source_id: item.id.clone(),
            dest_id,
            status,
            detail,
        };

        if conflicts.contains(&item.name) {
            debug!(name = %item.name, "skipping conflicting component");
            return pending(Status::Skipped, None, format!("already exists in {dest}"));
        }
        if self.options.dry_run {
            return pending(Status::DryRun, None, format!("would create in {dest}"));
        }

        let created = self
            .directory
            .create(dest, &item.name, item.description.as_deref());
        pacer.pause(self.options.delay);

        match created {
            Ok(new_item) => pending(Status::Migrated, Some(new_item.id), "created".to_string()),
            Err(err) => {
                warn!(name = %item.name, error = %err, "component creation failed");
                pending(Status::Failed, None, err.remote_message())
            }
        }
    }
}
