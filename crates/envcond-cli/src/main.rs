//! envcond CLI - Command-line interface
//!
//! Usage:
//!   envcond parse <input> <output>
//!   envcond inspect <text>

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use envcond_core::config::parse_delimiter;
use envcond_core::{AppConfig, Factor, GroupKeyMode, LoggingConfig, NoMatchPolicy, OutputFormat};
use envcond_extractor::ComponentAssembler;

#[derive(Parser)]
#[command(name = "envcond")]
#[command(about = "Parse free-text environmental conditions into a structured graph")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Environmental factor to parse
    #[arg(long, global = true)]
    factor: Option<Factor>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a trait table into a graph file
    Parse {
        /// Input table (.tsv or .csv)
        input: PathBuf,
        /// Output file (.nt or .json)
        output: PathBuf,
        /// Output format (ntriples, json); inferred from the output extension if omitted
        #[arg(long)]
        format: Option<OutputFormat>,
        /// Parse group key (raw_text, subject_predicate_text)
        #[arg(long)]
        group_key: Option<GroupKeyMode>,
        /// Behaviour when nothing matches (whole_text, empty)
        #[arg(long)]
        no_match: Option<NoMatchPolicy>,
        /// Field delimiter (a character, "tab", "comma", ...)
        #[arg(long)]
        delimiter: Option<String>,
    },
    /// Print the parse of a single text value as JSON
    Inspect {
        /// Free-text condition value
        text: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    if let Some(factor) = cli.factor {
        config.parse.factor = factor;
    }

    init_tracing(&config.logging);
    tracing::debug!(factor = %config.parse.factor, "configuration loaded");

    match cli.command {
        Commands::Parse {
            input,
            output,
            format,
            group_key,
            no_match,
            delimiter,
        } => {
            if let Some(format) = format.or_else(|| format_from_path(&output)) {
                config.output.format = format;
            }
            if let Some(group_key) = group_key {
                config.parse.group_key = group_key;
            }
            if let Some(no_match) = no_match {
                config.parse.no_match = no_match;
            }
            if let Some(delimiter) = delimiter {
                config.input.delimiter = Some(parse_delimiter(&delimiter)?);
            }

            let summary = envcond_graph::run(&config, &input, &output)
                .with_context(|| format!("failed to parse {}", input.display()))?;
            println!("{summary}");
        }
        Commands::Inspect { text } => {
            config.validate()?;
            let assembler = ComponentAssembler::from_config(&config.parse)?;
            let components = assembler.assemble(&text);
            println!("{}", serde_json::to_string_pretty(&components)?);
        }
    }

    Ok(())
}

fn format_from_path(path: &Path) -> Option<OutputFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(OutputFormat::from_extension)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("envcond={}", logging.level).into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}
