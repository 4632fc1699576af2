// CLI application
use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use modhost_cli::commands::{
    create_category, emit_event, list_mods, load_files, show_info, show_menu, ConsoleMessenger,
};
use modhost_core::{HostConfig, ModHost, ReadyFlag};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "modhost")]
#[command(about = "Load Lua mods and drive them with host events")]
#[command(version)]
struct Cli {
    /// Directory of mods to load (default: from the config file)
    #[arg(short, long, global = true)]
    mod_dir: Option<PathBuf>,

    /// Config file to read instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List loaded mods
    List,
    /// Show the information dialog text of a mod
    Info {
        /// Mod id
        id: String,
    },
    /// Fire an event at every loaded mod
    Emit {
        /// Event name, e.g. categoryCreating
        event: String,

        /// Let listeners cancel the event
        #[arg(long)]
        cancelable: bool,

        /// Event detail as JSON
        #[arg(long)]
        detail: Option<String>,
    },
    /// Build a menu from the hooks mods registered for it
    Menu {
        /// Hook name, e.g. scriptsMenu
        hook: String,

        /// Run the item with this label after building the menu
        #[arg(long)]
        activate: Option<String>,
    },
    /// Create a category, letting mods veto it
    Category {
        name: String,

        #[arg(long)]
        color: Option<String>,
    },
    /// Load extra mod files on top of the mod directory
    Load {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => HostConfig::load_from(path)?,
        None => HostConfig::load()?,
    };
    if let Some(dir) = cli.mod_dir {
        config.mod_dir = dir;
    }

    let pb = create_progress_bar("Loading mods...");
    let host = ModHost::start(&config, Arc::new(ConsoleMessenger), &ReadyFlag::ready())
        .await
        .context("Failed to start mod host")?;
    pb.finish_with_message(format!("Loaded {} mods", host.list().len()));

    match cli.command {
        Commands::List => list_mods(&host)?,
        Commands::Info { id } => show_info(&host, &id)?,
        Commands::Emit {
            event,
            cancelable,
            detail,
        } => emit_event(&host, &event, cancelable, detail.as_deref())?,
        Commands::Menu { hook, activate } => show_menu(&host, &hook, activate.as_deref())?,
        Commands::Category { name, color } => create_category(&host, &name, color.as_deref())?,
        Commands::Load { files } => load_files(&host, &files)?,
    }

    host.unload_all()?;
    Ok(())
}

fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb
}
