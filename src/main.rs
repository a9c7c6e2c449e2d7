use anyhow::{Context, Result};
use clap::Parser;
use pmtm_import::{ImportConfig, import_path};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pmtm-import")]
#[command(about = "Import a PMTM timing file into the results database")]
struct Cli {
    /// Log every generated statement
    #[arg(short, long)]
    debug: bool,

    /// Check the file without updating the database
    #[arg(short = 'x', long)]
    dry_run: bool,

    /// Snapshot file holding the results database
    #[arg(long, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Keep a copy of every imported file here
    #[arg(long, value_name = "DIR")]
    archive_dir: Option<PathBuf>,

    /// Recorded as the run creator instead of the login name
    #[arg(long, value_name = "NAME")]
    creator: Option<String>,

    /// Print the import report as JSON
    #[arg(long)]
    json: bool,

    file: PathBuf,
}

impl Cli {
    fn config(&self) -> ImportConfig {
        let mut config = ImportConfig::from_env().dry_run(self.dry_run);
        if let Some(store) = &self.store {
            config = config.store_path(store);
        }
        if let Some(dir) = &self.archive_dir {
            config = config.archive_dir(dir);
        }
        if let Some(creator) = &self.creator {
            config = config.creator(creator);
        }
        config
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let report = import_path(&cli.file, cli.config())
        .with_context(|| format!("file \"{}\"", cli.file.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.dry_run {
        println!("{}: run checked, nothing written", cli.file.display());
    } else {
        println!(
            "{}: imported run {} ({} parameters, {} timers, {} overheads)",
            cli.file.display(),
            report.run_id,
            report.parameters,
            report.timers,
            report.overheads
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
