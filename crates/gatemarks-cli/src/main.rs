//! gatemarks CLI — score GATE DA response sheets from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "gatemarks",
    version,
    about = "GATE DA response-sheet marks calculator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one or more response sheets
    Score {
        /// Response sheet URL or saved HTML file (repeatable)
        #[arg(long, required = true)]
        sheet: Vec<String>,

        /// Answer key file (.toml, text rendering, or official .pdf)
        #[arg(long)]
        answer_key: Option<PathBuf>,

        /// Output format: text, json, html, csv, markdown, all (comma-separated)
        #[arg(long, default_value = "text")]
        format: String,

        /// Output directory (defaults to output_dir from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Do not record totals in the rank store
        #[arg(long)]
        no_rank: bool,
    },

    /// Show the rank table and score statistics
    Ranks {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of rows to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Load and check an answer key
    ValidateKey {
        /// Answer key file
        #[arg(long)]
        answer_key: PathBuf,
    },

    /// Create a starter config and example answer key
    Init,
}

#[tokio::main]
async fn main() {
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gatemarks=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Score {
            sheet,
            answer_key,
            format,
            output,
            config,
            no_rank,
        } => commands::score::execute(sheet, answer_key, format, output, config, no_rank).await,
        Commands::Ranks { config, limit } => commands::ranks::execute(config, limit).await,
        Commands::ValidateKey { answer_key } => commands::validate_key::execute(answer_key),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
