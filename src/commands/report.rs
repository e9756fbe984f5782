use std::path::Path;

use crate::error::Result;
use crate::output::{self, Format};
use crate::report;
use crate::store::run_dir::RunDir;

/// Rebuild `component_mapping.csv` and `summary.json` for a finished run.
pub fn run(run_dir: &Path, format: Format) -> Result<()> {
    let run = RunDir::open(run_dir)?;
    let regenerated = report::regenerate(&run)?;
    report::write(&run, &regenerated)?;
    output::print_report(&regenerated, format)
}
