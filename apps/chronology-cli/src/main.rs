//! Chronology CLI
//!
//! Extracts the chronology of recurring actions from a meeting-minutes
//! document, or re-filters a previously saved action table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use chronology_engine::{
    filter, ActionTable, ChronologyConfig, ChronologyEngine, ChronologyRenderer, Diagnostic,
    Extraction, Filter,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use minutes_pdf::{PageSource, PdfPageReader, TextPageReader};
use minutes_types::{parse_date, CompressedAction};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "chronology")]
#[command(
    version,
    about = "Chronology of recurring actions in site-meeting minutes"
)]
struct Cli {
    /// TOML file overriding the extraction heuristics
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline over a document
    Extract {
        /// PDF path, or text path with --text
        source: String,

        /// Read a form-feed separated text file instead of a PDF
        #[arg(long)]
        text: bool,

        #[command(flatten)]
        filter: FilterArgs,

        /// Also save the compressed actions as a CSV table
        #[arg(long)]
        out: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,

        /// Cache directory (overrides the config file)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// Print the detected report page ranges
    Spans {
        source: String,

        #[arg(long)]
        text: bool,
    },

    /// Filter a saved action table
    Filter {
        table: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Subject substring, may be repeated
    #[arg(long = "subject")]
    subjects: Vec<String>,

    /// Earliest date, DD-MM-YYYY
    #[arg(long, value_parser = parse_cli_date)]
    date_min: Option<NaiveDate>,

    /// Latest date, DD-MM-YYYY
    #[arg(long, value_parser = parse_cli_date)]
    date_max: Option<NaiveDate>,

    #[arg(long)]
    report_min: Option<u32>,

    #[arg(long)]
    report_max: Option<u32>,
}

impl FilterArgs {
    fn to_filter(&self) -> Filter {
        let filter = Filter::new()
            .with_date_bounds(self.date_min, self.date_max)
            .with_report_bounds(self.report_min, self.report_max);
        if self.subjects.is_empty() {
            filter
        } else {
            filter.with_subjects(self.subjects.iter().cloned())
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Csv,
    Markdown,
    Json,
}

fn parse_cli_date(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).map_err(|e| format!("expected DD-MM-YYYY: {}", e))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &cli.config {
        Some(path) => ChronologyConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ChronologyConfig::default(),
    };

    match cli.command {
        Command::Extract {
            source,
            text,
            filter,
            out,
            format,
            cache_dir,
        } => {
            if cache_dir.is_some() {
                config.cache_dir = cache_dir;
            }
            let extraction = if text {
                extract(config, TextPageReader::new(), &source, &filter.to_filter())?
            } else {
                extract(config, PdfPageReader::new(), &source, &filter.to_filter())?
            };
            if let Some(path) = out {
                ActionTable::save(&path, &extraction.actions)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                tracing::info!("Saved {} actions to {}", extraction.actions.len(), path.display());
            }
            write_extraction(&extraction, format)?;
        }
        Command::Spans { source, text } => {
            let (spans, diagnostics) = if text {
                ChronologyEngine::new(config, TextPageReader::new())?.spans(&source)?
            } else {
                ChronologyEngine::new(config, PdfPageReader::new())?.spans(&source)?
            };
            tracing::info!(
                "{} reports, {} pages without report number",
                spans.len(),
                unmatched_pages(&diagnostics)
            );
            let mut stdout = io::stdout().lock();
            for span in spans {
                let tags: Vec<&str> = span.type_tags.iter().map(String::as_str).collect();
                writeln!(
                    stdout,
                    "CR {:02}\tpages {}-{}\t{}",
                    span.report_number,
                    span.page_start,
                    span.page_end,
                    tags.join(",")
                )?;
            }
        }
        Command::Filter {
            table,
            filter: args,
            format,
        } => {
            let actions = ActionTable::load(&table)
                .with_context(|| format!("Failed to read table: {}", table.display()))?;
            let narrowed = filter(&actions, &args.to_filter());
            tracing::info!("{} of {} actions kept", narrowed.len(), actions.len());
            write_actions(&narrowed, format)?;
        }
    }

    Ok(())
}

fn unmatched_pages(diagnostics: &[Diagnostic]) -> usize {
    diagnostics
        .iter()
        .filter(|d| matches!(d, Diagnostic::UnmatchedReportNumber { .. }))
        .count()
}

fn extract<S: PageSource>(
    config: ChronologyConfig,
    source: S,
    source_id: &str,
    filter: &Filter,
) -> Result<Extraction> {
    let engine = ChronologyEngine::new(config, source)?;
    engine
        .extract(source_id, filter)
        .with_context(|| format!("Extraction failed for {}", source_id))
}

fn write_extraction(extraction: &Extraction, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let mut stdout = io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, extraction)?;
        writeln!(stdout)?;
        return Ok(());
    }
    write_actions(&extraction.actions, format)
}

fn write_actions(actions: &[CompressedAction], format: OutputFormat) -> Result<()> {
    let mut stdout = io::stdout().lock();
    match format {
        OutputFormat::Csv => ActionTable::write(actions, &mut stdout)?,
        OutputFormat::Markdown => write!(stdout, "{}", ChronologyRenderer::to_markdown(actions))?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut stdout, actions)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}
