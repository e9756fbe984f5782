use std::io::Write;

use colored::Colorize;

use crate::engine::{Event, Observer};
use crate::error::Result;
use crate::model::Status;
use crate::report::log_line;
use crate::store::run_dir::{MIGRATION_LOG, RunDir};

/// Live progress lines for a terminal.
pub struct Console<W: Write> {
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Observer for Console<W> {
    fn notify(&mut self, event: &Event<'_>) -> Result<()> {
        match event {
            Event::Started {
                total,
                conflicts,
                dry_run,
            } => {
                let mode = if *dry_run { " (dry run)".yellow().to_string() } else { String::new() };
                writeln!(
                    self.out,
                    "Processing {total} components, {conflicts} conflicting{mode}"
                )?;
            }
            Event::Recorded {
                position,
                total,
                outcome,
            } => {
                let label = match outcome.status {
                    Status::Migrated => "MIGRATED".green(),
                    Status::Skipped => "SKIPPED".yellow(),
                    Status::Failed => "FAILED".red(),
                    Status::DryRun => "DRY RUN".cyan(),
                };
                let detail = match (&outcome.status, &outcome.dest_id) {
                    (Status::Migrated, Some(id)) => format!("-> {id}"),
                    _ => outcome.detail.clone(),
                };
                writeln!(
                    self.out,
                    "[{position}/{total}] {label} {} ({}) {detail}",
                    outcome.name.bold(),
                    outcome.source_id
                )?;
            }
            Event::Finished { counts } => {
                writeln!(
                    self.out,
                    "Done: {} total, {} migrated, {} skipped, {} failed, {} dry run",
                    counts.total,
                    counts.migrated.to_string().green(),
                    counts.skipped.to_string().yellow(),
                    counts.failed.to_string().red(),
                    counts.dry_run
                )?;
            }
        }
        Ok(())
    }
}

/// Appends each outcome to `migration_log.txt` as soon as it is recorded,
/// so an interrupted run still leaves a valid prefix on disk.
pub struct RunLog<'a> {
    run: &'a RunDir,
}

impl<'a> RunLog<'a> {
    pub fn new(run: &'a RunDir) -> Self {
        Self { run }
    }
}

impl Observer for RunLog<'_> {
    fn notify(&mut self, event: &Event<'_>) -> Result<()> {
        match event {
            // Creates the file even for an empty source.
            Event::Started { .. } => self.run.write_text(MIGRATION_LOG, ""),
            Event::Recorded { outcome, .. } => self.run.append_line(MIGRATION_LOG, &log_line(outcome)),
            Event::Finished { .. } => Ok(()),
        }
    }
}
