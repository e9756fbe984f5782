use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, Utc};
use tracing::{info, warn};

use crate::build_info;
use crate::commands::check::preflight;
use crate::config::Settings;
use crate::conflict::{self, ConflictSet};
use crate::engine::{Engine, MigrationOptions, Observer, Pacer, Tee, ThreadSleep};
use crate::error::Result;
use crate::model::{Phase, RunMeta, Snapshot};
use crate::output::{self, Format};
use crate::progress::{Console, RunLog};
use crate::remote::Directory;
use crate::remote::http::HttpDirectory;
use crate::report::{self, Report};
use crate::store::run_dir::{self, RunDir};
use crate::store::snapshots::SnapshotStore;
use crate::verify;

/// Everything one run needs besides the remote service itself.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub run_id: String,
    pub url: String,
    pub source: String,
    pub dest: String,
    pub output_dir: PathBuf,
    pub delay_ms: u64,
    pub dry_run: bool,
    pub backup: bool,
}

impl RunPlan {
    pub fn new(settings: &Settings, dry_run: bool, skip_backup: bool, run_id: String) -> Self {
        Self {
            run_id,
            url: settings.url.clone(),
            source: settings.source.clone(),
            dest: settings.dest.clone(),
            output_dir: settings.output_dir.clone(),
            delay_ms: settings.delay_ms,
            dry_run,
            backup: !skip_backup,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed { report: Report, run_dir: PathBuf },
    /// The operator declined at the confirmation prompt; nothing was created.
    Declined { run_dir: PathBuf },
}

/// Capture, detect, migrate, verify, report.
///
/// `approve` is consulted once, after conflicts are known and before the
/// first write; it is not consulted for dry runs.
pub fn execute(
    directory: &dyn Directory,
    plan: &RunPlan,
    pacer: &mut dyn Pacer,
    progress: &mut dyn Observer,
    approve: &mut dyn FnMut(&Snapshot, &ConflictSet) -> Result<bool>,
) -> Result<RunOutcome> {
    preflight(directory, &plan.source, &plan.dest)?;

    let run = RunDir::create(&plan.output_dir, &plan.run_id)?;
    let store = SnapshotStore::new(&run, plan.backup);
    info!(run_dir = %run.path().display(), "run started");

    let source = store.capture(directory, &plan.source, Phase::Source)?;
    let before = store.capture(directory, &plan.dest, Phase::DestBefore)?;
    let conflicts = conflict::detect(&source, &before);
    run.write_conflicts(&conflicts)?;

    let meta = RunMeta {
        run_id: plan.run_id.clone(),
        started_at: Utc::now(),
        url: plan.url.clone(),
        source: plan.source.clone(),
        dest: plan.dest.clone(),
        dry_run: plan.dry_run,
        delay_ms: plan.delay_ms,
        backup: plan.backup,
        source_count: source.len(),
        dest_before_count: before.len(),
        conflict_count: conflicts.len(),
        tool_version: build_info::version().to_string(),
        git_sha: build_info::git_sha().map(str::to_string),
    };
    run.write_meta(&meta)?;

    if !plan.dry_run && !approve(&source, &conflicts)? {
        info!("run declined at confirmation");
        return Ok(RunOutcome::Declined {
            run_dir: run.path().to_path_buf(),
        });
    }

    let engine = Engine::new(
        directory,
        MigrationOptions {
            dry_run: plan.dry_run,
            delay: plan.delay(),
        },
    );
    let mut observers = Tee(RunLog::new(&run), progress);
    let result = engine.run(&source, &plan.dest, &conflicts, pacer, &mut observers)?;
    run.write_outcomes(&result.outcomes)?;

    // Creates have already happened; a failed re-list must not cost the mapping.
    let mut verification_error = None;
    let after = if plan.dry_run {
        None
    } else {
        match verify::verify(&store, directory, &plan.dest, before.len(), result.counts.migrated) {
            Ok((after, _)) => Some(after),
            Err(err) => {
                warn!(error = %err, "destination re-list failed; writing report without verification");
                run.write_text(run_dir::VERIFY_ERROR, &format!("{err}\n"))?;
                verification_error = Some(err.to_string());
                None
            }
        }
    };

    let report = Report::build(&meta, after.as_ref(), &result.outcomes)
        .with_verification_error(verification_error);
    report::write(&run, &report)?;
    Ok(RunOutcome::Completed {
        report,
        run_dir: run.path().to_path_buf(),
    })
}

/// Ask a yes/no question; anything but `y`/`yes` (or end of input) is no.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> Result<bool> {
    write!(out, "{prompt} [y/N] ")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(false);
    }
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

pub fn run(settings: &Settings, dry_run: bool, yes: bool, skip_backup: bool, format: Format) -> Result<()> {
    let directory = HttpDirectory::new(&settings.url, &settings.token, settings.timeout)?;
    let plan = RunPlan::new(settings, dry_run, skip_backup, run_dir::run_id(Local::now()));
    let mut console = Console::new(std::io::stderr());

    let mut ask = |source: &Snapshot, conflicts: &ConflictSet| -> Result<bool> {
        if yes {
            return Ok(true);
        }
        let eligible = source
            .items
            .iter()
            .filter(|item| !conflicts.contains(&item.name))
            .count();
        let prompt = format!(
            "Create up to {eligible} components in {} ({} conflicting will be skipped)?",
            settings.dest,
            source.len() - eligible
        );
        confirm(&mut std::io::stdin().lock(), &mut std::io::stderr(), &prompt)
    };

    match execute(&directory, &plan, &mut ThreadSleep, &mut console, &mut ask)? {
        RunOutcome::Completed { report, run_dir } => {
            eprintln!("Artifacts written to {}", run_dir.display());
            output::print_report(&report, format)
        }
        RunOutcome::Declined { run_dir } => {
            eprintln!("Aborted; no components were created ({})", run_dir.display());
            Ok(())
        }
    }
}
