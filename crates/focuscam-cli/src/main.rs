mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use focuscam_core::config::get_data_dir;
use std::path::PathBuf;

use commands::{
    board::show_board,
    config::{handle_config_init, handle_config_path, handle_config_show},
    daemon::{feed_daemon, run_daemon_process, show_status, start_daemon, stop_daemon},
    helpers::SessionArgs,
    history::{clear_history, list_history, show_session},
    run::{run_session, RunArgs},
};

#[derive(Parser)]
#[command(name = "focuscam")]
#[command(about = "Webcam study-focus monitor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a study session in the foreground, reading predictions from stdin or a file
    Run(RunArgs),
    /// Start a study session in the background
    Start {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// (Internal) Run the daemon process
    #[command(hide = true)]
    DaemonInternalStart {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// End the background session and print its summary
    Stop {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the background session's live state
    Status,
    /// Forward predictions from stdin or a file to the background session
    Feed {
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Show per-class prediction percentages without tracking a session
    Board {
        /// Model metadata.json listing the class labels
        #[arg(short, long)]
        metadata: PathBuf,
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// List recorded sessions, newest first
    History {
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },
    /// Show one recorded session with its log
    Show {
        /// Session id or its first characters
        id: String,
    },
    /// Delete all recorded sessions
    Clear {
        #[arg(short, long)]
        yes: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if !matches!(cli.command, Commands::DaemonInternalStart { .. }) {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_secs()
            .init();
    }

    let data_dir = get_data_dir()?;

    match cli.command {
        Commands::Run(args) => run_session(args).await,
        Commands::Start { session } => start_daemon(&data_dir, &session),
        Commands::DaemonInternalStart { session } => run_daemon_process(session).await,
        Commands::Stop { yes } => stop_daemon(&data_dir, yes).await,
        Commands::Status => show_status(&data_dir).await,
        Commands::Feed { input } => feed_daemon(&data_dir, input).await,
        Commands::Board { metadata, input } => show_board(&metadata, input).await,
        Commands::History { limit } => list_history(limit),
        Commands::Show { id } => show_session(&id),
        Commands::Clear { yes } => clear_history(yes),
        Commands::Config { action } => match action {
            ConfigAction::Show => handle_config_show(),
            ConfigAction::Path => handle_config_path(),
            ConfigAction::Init { force } => handle_config_init(force),
        },
    }
}
