use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

use crate::error::Result;
use crate::report::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

/// Result of `check`: both projects reachable, with a conflict preview.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CheckSummary {
    pub source: String,
    pub dest: String,
    pub source_count: usize,
    pub dest_count: usize,
    pub conflicts: Vec<String>,
}

pub fn render_report(report: &Report, format: Format) -> Result<String> {
    let out = match format {
        Format::Json => serde_json::to_string(report)?,
        Format::Pretty => {
            let c = &report.counts;
            let mut lines = vec![
                format!(
                    "{} {} -> {}{}",
                    "Run".bold(),
                    report.source,
                    report.dest,
                    if report.dry_run { " (dry run)" } else { "" }
                ),
                format!("  run id:       {}", report.run_id),
                format!(
                    "  source:       {} components ({} conflicting)",
                    report.source_count, report.conflict_count
                ),
                format!("  total:        {}", c.total),
                format!("  migrated:     {}", c.migrated.to_string().green()),
                format!("  skipped:      {}", c.skipped.to_string().yellow()),
                format!("  failed:       {}", c.failed.to_string().red()),
            ];
            if report.dry_run {
                lines.push(format!("  would create: {}", c.dry_run));
            }
            if let Some(v) = &report.verification {
                let note = if v.diverged {
                    format!(" (expected +{}, check for concurrent changes)", v.migrated)
                        .yellow()
                        .to_string()
                } else {
                    String::new()
                };
                lines.push(format!(
                    "  destination:  {} -> {} ({:+}){note}",
                    v.dest_before, v.dest_after, v.delta
                ));
            }
            if let Some(err) = &report.verification_error {
                lines.push(format!("  destination:  {}", format!("not verified ({err})").yellow()));
            }
            lines.join("\n")
        }
        Format::Minimal => {
            let c = &report.counts;
            format!(
                "total={} migrated={} skipped={} failed={} dry_run={}",
                c.total, c.migrated, c.skipped, c.failed, c.dry_run
            )
        }
    };
    Ok(out)
}

pub fn print_report(report: &Report, format: Format) -> Result<()> {
    println!("{}", render_report(report, format)?);
    Ok(())
}

pub fn render_check(check: &CheckSummary, format: Format) -> Result<String> {
    let out = match format {
        Format::Json => serde_json::to_string(check)?,
        Format::Pretty => {
            let mut lines = vec![
                format!("{} {} components", check.source.bold(), check.source_count),
                format!("{} {} components", check.dest.bold(), check.dest_count),
                format!("{} conflicting names", check.conflicts.len()),
            ];
            lines.extend(check.conflicts.iter().map(|n| format!("  {n}")));
            lines.join("\n")
        }
        Format::Minimal => format!(
            "source={} dest={} conflicts={}",
            check.source_count,
            check.dest_count,
            check.conflicts.len()
        ),
    };
    Ok(out)
}

pub fn print_check(check: &CheckSummary, format: Format) -> Result<()> {
    println!("{}", render_check(check, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Counts;
    use crate::verify::Verification;

    fn report() -> Report {
        Report {
            run_id: "20250301_142210".into(),
            source: "SRC".into(),
            dest: "DST".into(),
            dry_run: false,
            counts: Counts {
                total: 3,
                migrated: 1,
                failed: 1,
                skipped: 1,
                dry_run: 0,
            },
            source_count: 3,
            dest_before_count: 4,
            conflict_count: 1,
            verification: Some(Verification::compute(4, 5, 1)),
            verification_error: None,
            outcomes: vec![],
            mapping: vec![],
        }
    }

    #[test]
    fn minimal_is_one_line() {
        let text = render_report(&report(), Format::Minimal).unwrap();
        assert_eq!(text, "total=3 migrated=1 skipped=1 failed=1 dry_run=0");
    }

    #[test]
    fn json_carries_counts() {
        let text = render_report(&report(), Format::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["counts"]["migrated"], 1);
        assert_eq!(value["verification"]["delta"], 1);
    }

    #[test]
    fn pretty_shows_destination_delta() {
        colored::control::set_override(false);
        let text = render_report(&report(), Format::Pretty).unwrap();
        assert!(text.contains("destination:  4 -> 5 (+1)"));
    }

    #[test]
    fn pretty_flags_unverified_destination() {
        colored::control::set_override(false);
        let mut unverified = report();
        unverified.verification = None;
        unverified.verification_error = Some("transport failure (HTTP 503): HTTP 503".into());
        let text = render_report(&unverified, Format::Pretty).unwrap();
        assert!(text.contains("not verified (transport failure (HTTP 503): HTTP 503)"));
    }

    #[test]
    fn check_minimal() {
        let check = CheckSummary {
            source: "SRC".into(),
            dest: "DST".into(),
            source_count: 2,
            dest_count: 1,
            conflicts: vec!["API".into()],
        };
        assert_eq!(
            render_check(&check, Format::Minimal).unwrap(),
            "source=2 dest=1 conflicts=1"
        );
    }
}
