use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser, Debug)]
#[command(name = "sift", version, about = "Categorize bank transaction exports")]
struct Cli {
    /// Config file (default: platform config dir, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Canonicalize a bank CSV, fill categories and write the result
    Categorize {
        input: PathBuf,

        /// Output CSV (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Labeled CSV used only as classifier training data
        #[arg(long)]
        seed: Option<PathBuf>,
    },

    /// Inspect or edit the stored category rules
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },

    /// Categorize a single description
    Classify {
        text: String,

        /// Labeled CSV to train the classifier on
        #[arg(long)]
        train: Option<PathBuf>,
    },

    /// Print a CSV template
    Template,
}

#[derive(Subcommand, Debug)]
enum RulesCommand {
    /// Print every category with its patterns in /body/flags form
    List,

    /// Add a pattern to a category, e.g. `sift rules add Pets '/petco|chewy/i'`
    Add { category: String, pattern: String },

    /// Replace the stored rules with the built-in defaults
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.log_filter))
        .context("invalid log_filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Command::Template = cli.command {
        return commands::template();
    }

    let db = sift_storage::create_db(&cfg.database)
        .await
        .with_context(|| format!("open database {}", cfg.database.display()))?;
    tracing::debug!(database = %cfg.database.display(), "using settings database");

    let result = match cli.command {
        Command::Categorize {
            input,
            output,
            seed,
        } => commands::categorize(&db, &cfg, &input, output.as_deref(), seed.as_deref()).await,
        Command::Rules { command } => match command {
            RulesCommand::List => commands::rules_list(&db, &cfg).await,
            RulesCommand::Add { category, pattern } => {
                commands::rules_add(&db, &cfg, &category, &pattern).await
            }
            RulesCommand::Reset => commands::rules_reset(&db, &cfg).await,
        },
        Command::Classify { text, train } => {
            commands::classify(&db, &cfg, &text, train.as_deref()).await
        }
        Command::Template => commands::template(),
    };

    db.close().await;
    result
}
