//! gencaps: generate a C capability table from a CSV description.
//!
//! Input: mode (dec, enc, vpp), CSV path, optional output path (stdout when omitted).
//! Output: C array literals plus one root descriptor, written only after the whole
//! table rendered successfully.

use std::path::PathBuf;
use std::process::ExitCode;

use capsgen::{generate_file, GenOptions, Mode, Output};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Generate decode/encode/VPP capability tables
#[derive(Parser)]
#[command(name = "gencaps")]
#[command(author, version)]
#[command(about = "Generate C capability tables from a CSV description")]
struct Args {
    /// Type of capabilities to generate: dec, enc or vpp
    #[arg(value_parser = clap::value_parser!(Mode))]
    mode: Mode,

    /// Input capabilities file (.csv)
    input: PathBuf,

    /// Output file (.cpp/.h); standard output when omitted
    output: Option<PathBuf>,

    /// TOML file overriding descriptor version, include header or banner
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the run summary as JSON on standard error
    #[arg(long)]
    summary_json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error - {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let options = match &args.config {
        Some(path) => GenOptions::load(path)?,
        None => GenOptions::default(),
    };
    let output = match args.output {
        Some(path) => Output::File(path),
        None => {
            tracing::warn!("no output file specified, writing to stdout");
            Output::Stdout
        }
    };

    let summary = generate_file(args.mode, &args.input, &output, &options)?;

    eprintln!("{}", summary.report());
    if args.summary_json {
        eprintln!("{}", summary.to_json()?);
    }
    Ok(())
}
