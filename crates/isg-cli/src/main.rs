mod commands;
mod output;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "isg",
    version,
    about = "Fine-Kinney risk scoring and OHS form wizards"
)]
struct Cli {
    /// Log engine decisions to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a probability / severity / frequency triple
    Score {
        #[arg(short, long)]
        probability: Decimal,

        #[arg(short, long)]
        severity: Decimal,

        #[arg(short, long)]
        frequency: Decimal,

        /// Custom scoring method file (default: built-in Fine-Kinney)
        #[arg(short, long, value_name = "FILE")]
        method: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Find the band of an already computed score
    Classify {
        score: Decimal,

        #[arg(short, long, value_name = "FILE")]
        method: Option<PathBuf>,

        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Band the result of an AI hazard analysis (JSON file)
    Ai {
        input_file: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        method: Option<PathBuf>,

        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Score every row of a risk register (XLSX or JSON)
    Register {
        input_file: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        method: Option<PathBuf>,

        #[arg(short, long, default_value = "table")]
        output: String,

        /// Show recommendations and skipped rows
        #[arg(long)]
        details: bool,
    },
    /// Inspect and validate scoring methods
    Method {
        #[command(subcommand)]
        action: MethodAction,
    },
    /// Inspect wizards and drive a wizard draft
    Wizard {
        #[command(subcommand)]
        action: WizardAction,
    },
}

#[derive(Subcommand)]
enum MethodAction {
    /// List predefined scoring methods
    List,
    /// Print scales and bands of a method
    Explain {
        /// Method file (default: built-in Fine-Kinney)
        file: Option<PathBuf>,
    },
    /// Print the JSON schema with field descriptions
    Schema,
    /// Validate a custom method file
    Validate { file: PathBuf },
}

#[derive(Args)]
struct SessionArgs {
    /// Wizard preset name or definition file
    #[arg(short, long)]
    wizard: String,

    /// Draft file holding the session (created on first write)
    #[arg(short, long, value_name = "FILE")]
    draft: PathBuf,

    /// Custom scoring method file
    #[arg(short, long, value_name = "FILE")]
    method: Option<PathBuf>,
}

#[derive(Subcommand)]
enum WizardAction {
    /// List predefined wizards
    List,
    /// Describe the fields, steps and checks of a wizard
    Explain {
        /// Preset name or definition file
        wizard: String,
    },
    /// Validate a custom wizard definition file
    Validate { file: PathBuf },
    /// Show the current step, progress and data of a draft
    Status {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Set a field (the value is parsed according to the field kind)
    Set {
        #[command(flatten)]
        session: SessionArgs,
        key: String,
        value: String,
    },
    /// Clear a field
    Clear {
        #[command(flatten)]
        session: SessionArgs,
        key: String,
    },
    /// Go to a step by number (1-based) or id
    Goto {
        #[command(flatten)]
        session: SessionArgs,
        step: String,
    },
    /// Advance one step
    Next {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Go back one step
    Back {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Submit the draft and print the flat record; the draft is removed
    Submit {
        #[command(flatten)]
        session: SessionArgs,

        /// Print the full submission instead of the flat record
        #[arg(long)]
        full: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Score {
            probability,
            severity,
            frequency,
            method,
            output,
        } => commands::score::score(probability, severity, frequency, method, &output),
        Commands::Classify {
            score,
            method,
            output,
        } => commands::score::classify(score, method, &output),
        Commands::Ai {
            input_file,
            method,
            output,
        } => commands::score::ai(input_file, method, &output),
        Commands::Register {
            input_file,
            method,
            output,
            details,
        } => commands::register::run(input_file, method, &output, details),
        Commands::Method { action } => match action {
            MethodAction::List => commands::method::list(),
            MethodAction::Explain { file } => commands::method::explain(file),
            MethodAction::Schema => commands::method::schema(),
            MethodAction::Validate { file } => commands::method::validate(&file),
        },
        Commands::Wizard { action } => run_wizard(action),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_wizard(action: WizardAction) -> Result<(), isg_core::error::IsgError> {
    use crate::commands::wizard::{self, Edit, Target};

    match action {
        WizardAction::List => wizard::list(),
        WizardAction::Explain { wizard: name } => wizard::explain(&name),
        WizardAction::Validate { file } => wizard::validate(&file),
        WizardAction::Status { session } => wizard::status(&session.into()),
        WizardAction::Set {
            session,
            key,
            value,
        } => wizard::edit(&session.into(), Edit::Set { key, value }),
        WizardAction::Clear { session, key } => wizard::edit(&session.into(), Edit::Clear { key }),
        WizardAction::Goto { session, step } => {
            wizard::navigate(&session.into(), Target::Step(step))
        }
        WizardAction::Next { session } => wizard::navigate(&session.into(), Target::Next),
        WizardAction::Back { session } => wizard::navigate(&session.into(), Target::Back),
        WizardAction::Submit { session, full } => wizard::submit(&session.into(), full),
    }
}

impl From<SessionArgs> for commands::wizard::DraftLocation {
    fn from(args: SessionArgs) -> Self {
        commands::wizard::DraftLocation {
            wizard: args.wizard,
            draft: args.draft,
            method: args.method,
        }
    }
}
