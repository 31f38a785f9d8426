use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use reading_log::MissingColumnPolicy;
use reading_log::PipelineOptions;
use reading_log::cache::CacheOutcome;
use reading_log::cache::process_cached;
use reading_log::logging::init_logging;
use reading_log::summary::summarize;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "reading-log")]
#[command(about = "Normalizes student reading log workbooks into one canonical table")]
#[command(version)]
struct Cli {
    /// Log debug details of every stage
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a workbook and write the canonical table
    Process {
        /// Reading log workbook (.xlsx)
        input: PathBuf,
        /// Output workbook [default: output/<input stem>_processed.xlsx]
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Reprocess even when the input is unchanged since the last run
        #[arg(long)]
        force: bool,
        /// Only process sheets whose name matches one of these glob patterns
        #[arg(long = "sheets", value_name = "GLOB")]
        sheets: Vec<String>,
        /// Fail instead of reading a column missing from every sheet as unset
        #[arg(long)]
        fail_on_missing_column: bool,
    },
    /// Print each student's reading progress
    Summary {
        /// Reading log workbook (.xlsx)
        input: PathBuf,
        /// Only process sheets whose name matches one of these glob patterns
        #[arg(long = "sheets", value_name = "GLOB")]
        sheets: Vec<String>,
    },
}

fn options(sheets: &[String], fail_on_missing_column: bool) -> Result<PipelineOptions> {
    let mut options = PipelineOptions::default()
        .with_sheet_patterns(sheets)
        .context("Invalid sheet pattern")?;
    if fail_on_missing_column {
        options.missing_columns = MissingColumnPolicy::Fail;
    }
    Ok(options)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Process {
            input,
            output,
            force,
            sheets,
            fail_on_missing_column,
        } => {
            let options = options(&sheets, fail_on_missing_column)?;
            let outcome = process_cached(&input, output.as_deref(), &options, force)
                .with_context(|| format!("Failed to process '{}'", input.display()))?;
            match &outcome {
                CacheOutcome::Reused { output } => {
                    info!(output = %output.display(), "Output is up to date");
                }
                CacheOutcome::Processed { output, table } => {
                    info!(output = %output.display(), rows = table.len(), "Processed workbook");
                }
            }
            println!("{}", outcome.output().display());
        }
        Commands::Summary { input, sheets } => {
            let options = options(&sheets, false)?;
            let table = reading_log::process(&input, &options)
                .with_context(|| format!("Failed to process '{}'", input.display()))?;
            for summary in summarize(&table) {
                println!("{summary}");
            }
        }
    }
    Ok(())
}
