use std::path::PathBuf;

use clap::{Parser, Subcommand};
use esg_form_tools::extract::JsonExtractionAdapter;
use esg_form_tools::pipeline;
use esg_form_tools::{Result, ToolError};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging()?;
    match cli.command {
        Command::Generate(args) => execute_generate(args),
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn execute_generate(args: GenerateArgs) -> Result<()> {
    let adapter = JsonExtractionAdapter::new(args.regulatory, args.investor);
    let report = pipeline::generate(&adapter, &args.name, &args.output)?;

    println!(
        "wrote {} ({} metrics across {} sheets)",
        report.output.display(),
        report.metric_count,
        report.sheet_count
    );
    for entry in &report.audit {
        println!("  {entry}");
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Consolidate extracted ESG metrics into an Excel data-capture form."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the data-capture workbook from two extraction dumps.
    Generate(GenerateArgs),
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// JSON file holding the regulatory extraction output.
    #[arg(long)]
    regulatory: PathBuf,

    /// JSON file holding the investor-framework extraction output.
    #[arg(long)]
    investor: PathBuf,

    /// Directory the workbook is written into.
    #[arg(long, default_value = "outputs")]
    output: PathBuf,

    /// Report name; the workbook is saved as `<name>.xlsx`.
    #[arg(long, default_value = "ESG_DataCapture")]
    name: String,
}
