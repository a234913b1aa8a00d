//! The `reefmap extract` command: metadata without touching the catalog.

use clap::{Args, ValueEnum};
use reefmap_core::output::OutputFormat as CoreOutputFormat;
use reefmap_core::{Config, ImageRecord, MetadataExtractor, OutputWriter};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Supported output formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// Arguments for the `extract` command.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Image file or directory
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Compact JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}

/// Execute the extract command.
pub async fn execute(args: ExtractArgs, config: Config) -> anyhow::Result<()> {
    let extractor = MetadataExtractor::new(&config);
    let input = args.input.clone();

    let records: Vec<ImageRecord> = tokio::task::spawn_blocking(move || {
        if input.is_dir() {
            extractor.process_directory(&input).map(|report| report.records)
        } else {
            Ok(vec![extractor.extract(&input)])
        }
    })
    .await??;

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = OutputWriter::new(sink, args.format.into(), !args.compact);
    for record in records {
        writer.push(record)?;
    }
    let count = writer.finish()?;

    if let Some(path) = &args.output {
        tracing::info!("Wrote {} records to {:?}", count, path);
    }
    Ok(())
}
