use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use drive_backup::audit::RunOutcome;
use drive_backup::cli::{
    handle_auth_command, handle_config_command, handle_history_command, handle_list_command,
    handle_prune_command, handle_run_command, RunArgs, TargetArgs,
};
use drive_backup::config::{BackupPaths, Settings};

/// Exit status of a run whose upload succeeded but whose retention did not
const PARTIAL_SUCCESS_EXIT_CODE: i32 = 2;

#[derive(Parser)]
#[command(
    name = "drive-backup",
    author = "Kaylee Beyene",
    version,
    about = "Back up a directory to Google Drive with age-based retention",
    long_about = "drive-backup archives a directory into a timestamped .tar.gz, \
                  uploads it to a Google Drive folder and deletes archives older \
                  than the retention window. Run it from cron or a systemd timer.",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Archive, upload and prune (the default)
    Run(RunArgs),

    /// List remote archives with their retention decision
    #[command(alias = "ls")]
    List(TargetArgs),

    /// Delete expired remote archives without taking a backup
    Prune {
        #[command(flatten)]
        target: TargetArgs,

        /// Actually delete (otherwise only show what would be deleted)
        #[arg(long)]
        force: bool,
    },

    /// Authorize access to Google Drive
    Auth {
        /// Re-run the consent flow even if the stored session is valid
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration and paths
    Config {
        #[command(flatten)]
        args: RunArgs,

        /// Write the given values into the settings file
        #[arg(long)]
        save: bool,
    },

    /// Show recent runs
    History {
        /// Number of runs to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let paths = BackupPaths::new()?;
    let settings = Settings::load_or_default(&paths)?;

    match cli.command.unwrap_or(Commands::Run(cli.run)) {
        Commands::Run(args) => {
            let outcome = handle_run_command(&paths, &settings, args)?;
            if outcome == RunOutcome::Partial {
                std::process::exit(PARTIAL_SUCCESS_EXIT_CODE);
            }
        }
        Commands::List(target) => {
            handle_list_command(&paths, &settings, target)?;
        }
        Commands::Prune { target, force } => {
            handle_prune_command(&paths, &settings, target, force)?;
        }
        Commands::Auth { force } => {
            handle_auth_command(&paths, force)?;
        }
        Commands::Config { args, save } => {
            handle_config_command(&paths, &settings, args, save)?;
        }
        Commands::History { limit } => {
            handle_history_command(&paths, limit)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
