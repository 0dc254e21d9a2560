//! satprep CLI: validate, score, and grade SAT-style practice tests.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "satprep", version, about = "SAT-style practice test scoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate test definitions and, optionally, an attempt against them
    Validate {
        /// Path to a .toml test file or directory
        #[arg(long)]
        test: PathBuf,

        /// Attempt JSON to check against the test
        #[arg(long)]
        attempt: Option<PathBuf>,
    },

    /// Score a single attempt
    Score {
        /// Path to a .toml test file or directory
        #[arg(long)]
        test: PathBuf,

        /// Attempt JSON
        #[arg(long)]
        attempt: PathBuf,

        /// Output format: text, json, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Directory to write the report to
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Grade a directory of attempts through a configured store
    Grade {
        /// Attempt JSON file or directory
        #[arg(long)]
        attempts: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Store name from the config
        #[arg(long)]
        store: Option<String>,

        /// Max concurrent gradings (overrides config)
        #[arg(long)]
        parallelism: Option<usize>,
    },

    /// Compare two score reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Change in percentage points that counts as significant
        #[arg(long, default_value = "5.0")]
        threshold: f64,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List tests available in a store
    ListTests {
        /// Store name from the config
        #[arg(long)]
        store: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config, example test, and example attempt
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("satprep=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { test, attempt } => commands::validate::execute(test, attempt),
        Commands::Score {
            test,
            attempt,
            format,
            output,
        } => commands::score::execute(test, attempt, format, output).await,
        Commands::Grade {
            attempts,
            config,
            store,
            parallelism,
        } => commands::grade::execute(attempts, config, store, parallelism).await,
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::ListTests { store, config } => commands::list_tests::execute(store, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
