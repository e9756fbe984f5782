use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use component_migrate::config::{Settings, SettingsArgs};
use component_migrate::output::Format;

#[derive(Parser)]
#[command(
    name = "component-migrate",
    version,
    about = "Copy project components between projects over the REST API"
)]
struct Cli {
    /// Output format for the final summary
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    format: Format,
    /// Shorthand for --format json
    #[arg(long, global = true, hide = true)]
    json: bool,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate components from the source project to the destination project
    Migrate {
        #[command(flatten)]
        settings: SettingsArgs,
        /// Classify every component without creating anything
        #[arg(long)]
        dry_run: bool,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y', alias = "force")]
        yes: bool,
        /// Do not write the before-snapshots to the run directory
        #[arg(long)]
        skip_backup: bool,
    },
    /// Check both projects are reachable and preview conflicting names
    Check {
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Regenerate the mapping and summary of a finished run
    Report {
        /// Run directory (component_migration_<timestamp>)
        run_dir: PathBuf,
    },
}

fn run(cli: Cli, format: Format) -> component_migrate::error::Result<()> {
    match cli.command {
        Commands::Migrate {
            settings,
            dry_run,
            yes,
            skip_backup,
        } => {
            let settings = Settings::resolve(&settings)?;
            component_migrate::commands::migrate::run(&settings, dry_run, yes, skip_backup, format)
        }
        Commands::Check { settings } => {
            let settings = Settings::resolve(&settings)?;
            component_migrate::commands::check::run(&settings, format)
        }
        Commands::Report { run_dir } => component_migrate::commands::report::run(&run_dir, format),
    }
}

fn main() {
    let cli = Cli::parse();
    let format = if cli.json { Format::Json } else { cli.format };
    component_migrate::logging::init(cli.verbose);
    if let Err(e) = run(cli, format) {
        match format {
            Format::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "error": e.code(),
                        "message": e.to_string()
                    })
                );
            }
            _ => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}
