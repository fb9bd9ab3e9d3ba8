use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use tensorlake_tools::{
    ChunkingStrategy, TableOutputMode, TableParsingFormat, TensorlakeBackend, TensorlakeConfig,
};

#[derive(Parser, Debug)]
#[command(version, about = "A CLI tool for converting documents to markdown with Tensorlake DocumentAI", long_about = None)]
struct Args {
    /// Path to the config file. Defaults to ~/.tensorlake_config.json
    #[clap(short = 'c', long)]
    parse_config: Option<String>,

    /// Files or URLs to parse
    #[clap(required = true)]
    files: Vec<String>,

    /// Chunking strategy: none, page, section or fragment
    #[clap(long)]
    chunking_strategy: Option<ChunkingStrategy>,

    /// Table parsing algorithm: tsr or vlm
    #[clap(long)]
    table_parsing_format: Option<TableParsingFormat>,

    /// Table output format: markdown or html
    #[clap(long)]
    table_output_mode: Option<TableOutputMode>,

    /// Pages to parse, e.g. "1-5" or "1,3,5"
    #[clap(long)]
    page_range: Option<String>,

    /// Detect signatures
    #[clap(long)]
    signature_detection: bool,

    /// Summarize tables
    #[clap(long)]
    table_summarization: bool,

    /// Summarize figures and images
    #[clap(long)]
    figure_summarization: bool,

    /// Maximum seconds to wait for each document
    #[clap(long)]
    timeout_seconds: Option<u64>,

    /// Output directory for converted markdown
    #[clap(short, long)]
    output_dir: Option<String>,

    /// Always re-parse, ignoring cached results
    #[clap(long)]
    no_cache: bool,

    /// Verbose output while parsing
    #[clap(short, long)]
    verbose: bool,
}

impl Args {
    fn apply_to(&self, config: &mut TensorlakeConfig) {
        let options = &mut config.options;
        if let Some(strategy) = self.chunking_strategy {
            options.chunking_strategy = Some(strategy);
        }
        if let Some(format) = self.table_parsing_format {
            options.table_parsing_format = format;
        }
        if let Some(mode) = self.table_output_mode {
            options.table_output_mode = mode;
        }
        if let Some(ref range) = self.page_range {
            options.page_range = Some(range.clone());
        }
        if let Some(timeout) = self.timeout_seconds {
            options.timeout_seconds = timeout;
        }
        options.signature_detection |= self.signature_detection;
        options.table_summarization |= self.table_summarization;
        options.figure_summarization |= self.figure_summarization;

        if let Some(ref dir) = self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if self.no_cache {
            config.use_cache = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Get config file path
    let config_path = match args.parse_config {
        Some(ref path) => path.clone(),
        None => dirs::home_dir()
            .ok_or_else(|| anyhow::Error::msg("Could not find home directory"))?
            .join(".tensorlake_config.json")
            .to_string_lossy()
            .to_string(),
    };

    // Validate that files exist
    for file in &args.files {
        let is_remote = file.starts_with("http://") || file.starts_with("https://");
        if !is_remote && !Path::new(file).exists() {
            tracing::warn!("File does not exist: {file}");
        }
    }

    let mut config = TensorlakeConfig::from_config_file(&config_path)?;
    args.apply_to(&mut config);

    let backend = TensorlakeBackend::new(config)?;
    let results = backend.parse(args.files).await?;

    // Output the paths to parsed files, one per line
    for result_path in results {
        println!("{result_path}");
    }

    Ok(())
}
