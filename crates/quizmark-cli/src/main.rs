//! quizmark CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "quizmark", version, about = "LLM-assisted quiz grading")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options selecting the text-generation backend.
#[derive(Args, Clone)]
pub struct ProviderArgs {
    /// Provider name from the config (defaults to `default_provider`)
    #[arg(long)]
    pub provider: Option<String>,

    /// Model to use (defaults to `default_model`)
    #[arg(long)]
    pub model: Option<String>,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade one submission against an answer key
    #[command(group(ArgGroup::new("input").required(true).args(["answers", "submission"])))]
    Grade {
        /// Answer key (.json or .toml)
        #[arg(long)]
        key: PathBuf,

        /// Pre-extracted student answers (.json)
        #[arg(long)]
        answers: Option<PathBuf>,

        /// Raw submission text (.txt or .md), extracted with the LLM
        #[arg(long)]
        submission: Option<PathBuf>,

        /// Write the score report JSON here
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        llm: ProviderArgs,
    },

    /// Extract structured answers from a submission without grading
    Extract {
        /// Raw submission text (.txt or .md)
        #[arg(long)]
        submission: PathBuf,

        /// Write the answers JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        llm: ProviderArgs,
    },

    /// Grade a directory of submissions
    Batch {
        /// Answer key (.json or .toml)
        #[arg(long)]
        key: PathBuf,

        /// Directory of .txt / .md submissions
        #[arg(long)]
        submissions: PathBuf,

        /// Max submissions graded concurrently
        #[arg(long)]
        parallelism: Option<usize>,

        /// Output directory (defaults to `output_dir` from the config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, markdown, all
        #[arg(long, default_value = "json")]
        format: String,

        #[command(flatten)]
        llm: ProviderArgs,
    },

    /// Check an answer key for problems
    Validate {
        /// Answer key file or directory of keys
        #[arg(long)]
        key: PathBuf,
    },

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example answer key
    Init,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("quizmark_core=info,quizmark_providers=info,quizmark=info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            key,
            answers,
            submission,
            output,
            llm,
        } => commands::grade::execute(key, answers, submission, output, llm).await,
        Commands::Extract {
            submission,
            output,
            llm,
        } => commands::extract::execute(submission, output, llm).await,
        Commands::Batch {
            key,
            submissions,
            parallelism,
            output,
            format,
            llm,
        } => {
            commands::batch::execute(key, submissions, parallelism, output, format, llm).await
        }
        Commands::Validate { key } => commands::validate::execute(key),
        Commands::ListModels { provider, config } => {
            commands::list_models::execute(provider, config).await
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
