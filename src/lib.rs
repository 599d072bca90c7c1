//! Robochat: streaming tool orchestration for chat robots.
//!
//! Turns a provider's event stream into text, executes the tools the model
//! asks for, and delivers the result through streaming, immediate or
//! multi-part response contracts.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use robochat::prelude::*;
//!
//! # async fn example() -> robochat::error::Result<()> {
//! let settings = RobotSettings::load_default()?.apply_env_overrides()?;
//! let tools = Arc::new(StaticToolRegistry::new());
//! let robot = Robot::from_settings(settings, &RobotConfig::from_env(), tools)?;
//!
//! let reply = robot.respond_immediate(ConversationTurn::user("Hello!")).await;
//! println!("{}", reply.text);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod prelude;
pub mod provider;
pub mod robot;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
