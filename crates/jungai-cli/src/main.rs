mod analyze;
mod classify;
mod report;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "jungai-cli")]
#[command(about = "Classify brands into one of twelve archetypes from public text")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect, classify, and report on brands
    Analyze {
        /// Brand to analyze (repeatable); defaults to every configured brand
        #[arg(long = "brand")]
        brands: Vec<String>,

        /// Exit non-zero when any brand has no data or its report cannot be written
        #[arg(long)]
        strict: bool,

        /// Show which brands and sources would run without calling any service
        #[arg(long)]
        dry_run: bool,
    },
    /// Classify ad-hoc text without collecting sources
    Classify {
        /// Text to classify
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        /// Read the text to classify from a file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Brand name recorded on the verdict
        #[arg(long, default_value = "ad-hoc")]
        brand: String,
    },
    /// List emitted reports, newest first
    Report {
        /// Restrict to one brand (name or slug)
        #[arg(long)]
        brand: Option<String>,

        /// Maximum number of reports to show
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Print a markdown table instead of plain columns
        #[arg(long)]
        markdown: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("jungai-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = jungai_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Analyze {
            brands,
            strict,
            dry_run,
        } => analyze::run_analyze(&config, &brands, strict || config.strict, dry_run).await,
        Commands::Classify { text, file, brand } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path).map_err(|e| {
                    anyhow::anyhow!("failed to read {}: {e}", path.display())
                })?,
                (None, None) => anyhow::bail!("one of --text or --file is required"),
            };
            classify::run_classify(&config, &brand, &text).await
        }
        Commands::Report {
            brand,
            limit,
            markdown,
        } => report::run_report(&config, brand.as_deref(), limit, markdown).await,
    }
}

#[cfg(test)]
mod tests;
