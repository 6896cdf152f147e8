//! wordcat CLI: administer and score adaptive vocabulary checklists.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "wordcat",
    version,
    about = "Adaptive vocabulary checklist administration and scoring"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config, instrument, and norms
    Init,

    /// Validate an instrument file and optionally a norms file
    Validate {
        /// Path to instrument .toml
        #[arg(long)]
        instrument: PathBuf,

        /// Path to norms .json
        #[arg(long)]
        norms: Option<PathBuf>,
    },

    /// Rank items by information at an ability level
    Rank {
        /// Path to instrument .toml
        #[arg(long)]
        instrument: PathBuf,

        /// Ability level
        #[arg(long, allow_hyphen_values = true)]
        theta: f64,

        /// Number of items to show
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Start a new session and print the first word
    Start {
        /// State file to create (default: <state_dir>/<session id>.json)
        #[arg(long)]
        state: Option<PathBuf>,

        /// Path to instrument .toml (default: from config)
        #[arg(long)]
        instrument: Option<PathBuf>,

        /// Age in months
        #[arg(long)]
        age: Option<u32>,

        /// Sex (female/male)
        #[arg(long)]
        sex: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Record an answer and print the next word or the final estimate
    ///
    /// Run one `answer` at a time per state file. Concurrent answers to the
    /// same file are not merged: the last one to finish wins.
    Answer {
        /// State file written by `start`
        #[arg(long)]
        state: PathBuf,

        /// Word being answered
        #[arg(long)]
        word: String,

        /// The child says the word
        #[arg(long, conflicts_with = "no", required_unless_present = "no")]
        yes: bool,

        /// The child does not say the word
        #[arg(long)]
        no: bool,

        /// Path to instrument .toml (default: from config)
        #[arg(long)]
        instrument: Option<PathBuf>,

        /// Path to norms .json (default: from config)
        #[arg(long)]
        norms: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score a JSON list of word responses against the norms
    Score {
        /// Path to responses .json
        #[arg(long)]
        responses: PathBuf,

        /// Age in months
        #[arg(long)]
        age: u32,

        /// Sex (female/male)
        #[arg(long)]
        sex: String,

        /// Path to norms .json (default: from config)
        #[arg(long)]
        norms: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the progress of a session
    Show {
        /// State file
        #[arg(long)]
        state: PathBuf,

        /// Path to instrument .toml (default: from config)
        #[arg(long)]
        instrument: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wordcat=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { instrument, norms } => commands::validate::execute(instrument, norms),
        Commands::Rank {
            instrument,
            theta,
            top,
        } => commands::rank::execute(instrument, theta, top),
        Commands::Start {
            state,
            instrument,
            age,
            sex,
            config,
        } => commands::start::execute(state, instrument, age, sex, config),
        Commands::Answer {
            state,
            word,
            yes,
            no: _,
            instrument,
            norms,
            config,
        } => commands::answer::execute(state, word, yes, instrument, norms, config),
        Commands::Score {
            responses,
            age,
            sex,
            norms,
            format,
            config,
        } => commands::score::execute(responses, age, sex, norms, format, config),
        Commands::Show {
            state,
            instrument,
            config,
        } => commands::show::execute(state, instrument, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
