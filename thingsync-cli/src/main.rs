use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod dispatch;
mod document;
mod pending;
mod state;

#[derive(Parser, Debug)]
#[command(
    name = "thingsync",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("THINGSYNC_BUILD_SHA"), ")"),
    about = "Sync markdown to-dos with Things"
)]
struct Cli {
    /// Log extraction and encoding decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a Things to-do from one line of a note
    Create {
        #[arg(long)]
        file: PathBuf,

        /// 1-based line number of the task
        #[arg(long)]
        line: usize,

        /// Print the request URL instead of opening it
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Create every unlinked task under the note's "# Now" heading
    CreateNow {
        #[arg(long)]
        file: PathBuf,

        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Push the toggled completion state of a linked task via Shortcuts
    Toggle {
        #[arg(long)]
        file: PathBuf,

        #[arg(long)]
        line: usize,

        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Mark a linked task complete in Things and tick it in the note
    Complete {
        #[arg(long)]
        file: PathBuf,

        #[arg(long)]
        line: usize,

        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Push the completion state of every linked "# Now" task via Shortcuts
    SyncNow {
        #[arg(long)]
        file: PathBuf,

        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Apply a Things x-success callback URL to the note it answers
    Callback {
        /// e.g. obsidian://things-sync-id?request=..&x-things-id=..
        url: String,
    },

    /// Print the task record and target parsed from one line
    Show {
        #[arg(long)]
        file: PathBuf,

        #[arg(long)]
        line: usize,
    },

    /// Manage ~/.thingsync/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Create {
            file,
            line,
            dry_run,
        } => commands::create(&file, line, dry_run)?,
        Command::CreateNow { file, dry_run } => commands::create_now(&file, dry_run)?,
        Command::Toggle {
            file,
            line,
            dry_run,
        } => commands::toggle(&file, line, dry_run)?,
        Command::Complete {
            file,
            line,
            dry_run,
        } => commands::complete(&file, line, dry_run)?,
        Command::SyncNow { file, dry_run } => commands::sync_now(&file, dry_run)?,
        Command::Callback { url } => commands::callback(&url)?,
        Command::Show { file, line } => commands::show(&file, line)?,
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },
    }

    Ok(())
}
