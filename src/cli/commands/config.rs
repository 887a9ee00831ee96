//! jt config - Inspect or create the config file

use clap::{Args, Subcommand};
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output;
use crate::config::Config;
use crate::error::{JtError, Result};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration (default)
    Show,
    /// Print the config file locations
    Path,
    /// Write the effective configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Serialize)]
struct PathOutput {
    config: String,
    global: Option<String>,
    root: String,
}

pub fn run(ctx: &AppContext, args: &ConfigArgs) -> Result<()> {
    match args.action.as_ref().unwrap_or(&ConfigAction::Show) {
        ConfigAction::Show => show(ctx),
        ConfigAction::Path => path(ctx),
        ConfigAction::Init { force } => init(ctx, *force),
    }
}

fn show(ctx: &AppContext) -> Result<()> {
    if ctx.robot_mode {
        return output::emit_robot(&output::robot_ok(&ctx.config));
    }
    println!("{}", render(&ctx.config)?);
    Ok(())
}

fn path(ctx: &AppContext) -> Result<()> {
    let data = PathOutput {
        config: ctx.config_path.display().to_string(),
        global: Config::global_path().map(|p| p.display().to_string()),
        root: ctx.root.display().to_string(),
    };
    if ctx.robot_mode {
        return output::emit_robot(&output::robot_ok(data));
    }
    println!("config: {}", data.config);
    if let Some(global) = &data.global {
        println!("global: {global}");
    }
    println!("root:   {}", data.root);
    Ok(())
}

fn init(ctx: &AppContext, force: bool) -> Result<()> {
    let path = &ctx.config_path;
    if path.exists() && !force {
        return Err(JtError::ValidationFailed(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }
    ctx.config.save_to(path)?;
    if ctx.robot_mode {
        output::emit_robot(&output::robot_ok(serde_json::json!({
            "path": path.display().to_string(),
        })))
    } else {
        println!("Wrote {}", path.display());
        Ok(())
    }
}

fn render(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).map_err(|err| JtError::Config(format!("serialize config: {err}")))
}
