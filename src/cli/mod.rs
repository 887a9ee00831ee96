//! Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;
pub mod output;

/// Track job applications across local and cloud storage
#[derive(Parser, Debug)]
#[command(name = "jt")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Machine-readable JSON output on stdout
    #[arg(long, short = 'm', visible_alias = "machine", global = true)]
    pub robot: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: <root>/config.toml over ~/.config/jt/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a new application
    Add(commands::add::AddArgs),

    /// Change fields of an application
    Edit(commands::edit::EditArgs),

    /// Delete an application
    Delete(commands::delete::DeleteArgs),

    /// List applications, optionally filtered
    List(commands::list::ListArgs),

    /// Show one application in full
    Show(commands::show::ShowArgs),

    /// Dashboard counts, rates, streak and achievements
    Stats(commands::stats::StatsArgs),

    /// Import a backup file
    Import(commands::import::ImportArgs),

    /// Export all applications as a backup file
    Export(commands::export::ExportArgs),

    /// Reconcile backends and push the collection everywhere
    Sync(commands::sync::SyncArgs),

    /// Delete every application from every backend
    Clear(commands::clear::ClearArgs),

    /// Save periodically until interrupted
    Autosync(commands::autosync::AutosyncArgs),

    /// Inspect or create the config file
    Config(commands::config::ConfigArgs),
}
