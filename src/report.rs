use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Counts, MappingRow, Outcome, Phase, RunMeta, Snapshot, Status};
use crate::store::run_dir::{MAPPING, RunDir, SUMMARY, VERIFY_ERROR};
use crate::store::snapshots::SnapshotStore;
use crate::verify::Verification;

pub const MAPPING_HEADER: &str = "Component_Name,Source_ID,Dest_ID,Status";

/// Audit summary of one run.
///
/// Built only from persisted inputs, so regenerating it from a run directory
/// reproduces `summary.json` and `component_mapping.csv` byte for byte.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub run_id: String,
    pub source: String,
    pub dest: String,
    pub dry_run: bool,
    pub counts: Counts,
    pub source_count: usize,
    pub dest_before_count: usize,
    pub conflict_count: usize,
    pub verification: Option<Verification>,
    /// Set when a live run could not re-list the destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_error: Option<String>,
    pub outcomes: Vec<Outcome>,
    pub mapping: Vec<MappingRow>,
}

impl Report {
    pub fn build(meta: &RunMeta, dest_after: Option<&Snapshot>, outcomes: &[Outcome]) -> Self {
        let counts = Counts::from_outcomes(outcomes);
        let verification = match dest_after {
            Some(after) if !meta.dry_run => Some(Verification::compute(
                meta.dest_before_count,
                after.len(),
                counts.migrated,
            )),
            _ => None,
        };
        Self {
            run_id: meta.run_id.clone(),
            source: meta.source.clone(),
            dest: meta.dest.clone(),
            dry_run: meta.dry_run,
            counts,
            source_count: meta.source_count,
            dest_before_count: meta.dest_before_count,
            conflict_count: meta.conflict_count,
            verification,
            verification_error: None,
            outcomes: outcomes.to_vec(),
            mapping: outcomes.iter().map(Outcome::mapping_row).collect(),
        }
    }

    pub fn with_verification_error(mut self, error: Option<String>) -> Self {
        self.verification_error = error;
        self
    }

    pub fn render_summary(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn render_mapping_csv(&self) -> String {
        let mut out = String::from(MAPPING_HEADER);
        out.push('\n');
        for row in &self.mapping {
            let dest_id = row.dest_id.as_deref().unwrap_or("");
            let status = row.status.to_string();
            let fields = [row.name.as_str(), row.source_id.as_str(), dest_id, status.as_str()];
            let line: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        out
    }
}

/// Quote a CSV field when it holds a comma, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One `migration_log.txt` line: `STATUS|name|source_id|detail_or_dest_id`.
pub fn log_line(outcome: &Outcome) -> String {
    let last = match (outcome.status, &outcome.dest_id) {
        (Status::Migrated, Some(dest_id)) => dest_id.as_str(),
        _ => outcome.detail.as_str(),
    };
    format!(
        "{}|{}|{}|{}",
        outcome.status.to_string().to_uppercase(),
        log_field(&outcome.name),
        log_field(&outcome.source_id),
        log_field(last)
    )
}

fn log_field(value: &str) -> String {
    value.replace(['|', '\n', '\r'], " ")
}

/// Write the derived artifacts of a report into its run directory.
pub fn write(run: &RunDir, report: &Report) -> Result<()> {
    run.write_text(MAPPING, &report.render_mapping_csv())?;
    run.write_text(SUMMARY, &report.render_summary()?)?;
    Ok(())
}

/// Rebuild a report from what a run left on disk.
pub fn regenerate(run: &RunDir) -> Result<Report> {
    let meta = run.read_meta()?;
    let outcomes = run.read_outcomes()?;
    let store = SnapshotStore::new(run, meta.backup);
    let after = store.load(&meta.dest, Phase::DestAfter)?;
    let verification_error = if run.exists(VERIFY_ERROR) {
        Some(run.read_text(VERIFY_ERROR)?.trim_end().to_string())
    } else {
        None
    };
    Ok(Report::build(&meta, after.as_ref(), &outcomes).with_verification_error(verification_error))
}
