//! CLI entry point for Robochat.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::RobotSettings;
use crate::error::RobotError;

/// Robochat CLI
#[derive(Parser, Debug)]
#[command(name = "robochat", version, about = "Chat with a tool-using robot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one turn to the robot
    Chat(ChatArgs),
}

/// How the reply is delivered.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Print chunks as they arrive
    #[default]
    Stream,
    /// Print the whole reply at once
    Immediate,
    /// Print the reply, then a delayed follow-up
    MultiPart,
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Model to use (format: provider:model, e.g., anthropic:claude-sonnet-4-5)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Response contract
    #[arg(long, value_enum, default_value_t = ResponseMode::Stream)]
    pub mode: ResponseMode,

    /// Settings file (defaults to the platform config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Response timeout in milliseconds (0 disables)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// User prompt
    pub prompt: String,
}

impl ChatArgs {
    /// Settings file, then `ROBOCHAT_*` env vars, then flags.
    pub fn resolve_settings(&self) -> Result<RobotSettings, RobotError> {
        let settings = match &self.config {
            Some(path) => RobotSettings::load(path)?,
            None => RobotSettings::load_default()?,
        };
        let mut settings = settings.apply_env_overrides()?;
        if let Some(model) = &self.model {
            settings.model = model.clone();
        }
        if let Some(system) = &self.system {
            settings.system_prompt = system.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            settings.response_timeout_ms = timeout_ms;
        }
        Ok(settings)
    }
}
