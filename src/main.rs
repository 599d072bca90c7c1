//! Robochat CLI binary entry point.

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use robochat::cli::{ChatArgs, Cli, Commands, ResponseMode};
use robochat::config::RobotConfig;
use robochat::orchestrator::{Chunk, ChunkKind};
use robochat::robot::{ChatRobot, Robot, StreamHandler};
use robochat::tools::StaticToolRegistry;
use robochat::types::ConversationTurn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("robochat=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Chat(chat_args) => handle_chat(chat_args).await,
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

struct TerminalHandler;

impl StreamHandler for TerminalHandler {
    fn on_chunk(&self, chunk: &Chunk) {
        match chunk.kind {
            ChunkKind::Diagnostic => eprint!("{}", chunk.text),
            ChunkKind::Text | ChunkKind::ToolResult => print!("{}", chunk.text),
        }
        let _ = std::io::stdout().flush();
    }

    fn on_finish(&self, _full_text: &str) {
        println!();
    }
}

/// Returns whether the reply was successful.
async fn handle_chat(args: ChatArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let settings = args.resolve_settings()?;
    let config = RobotConfig::from_env();
    let robot = Robot::from_settings(settings, &config, Arc::new(StaticToolRegistry::new()))?;
    let turn = ConversationTurn::user(args.prompt);

    let ok = match args.mode {
        ResponseMode::Stream => {
            let envelope = robot.respond_streaming(turn, Arc::new(TerminalHandler)).await;
            if let Some(failure) = &envelope.error {
                eprintln!("{}", failure.message);
            }
            !envelope.is_error()
        }
        ResponseMode::Immediate => {
            let envelope = robot.respond_immediate(turn).await;
            println!("{}", envelope.text);
            !envelope.is_error()
        }
        ResponseMode::MultiPart => {
            let response = robot.respond_multi_part(turn).await;
            println!("{}", response.immediate.text);
            let delayed = response.delayed.wait().await;
            println!("\n{}", delayed.text);
            !response.immediate.is_error() && !delayed.is_error()
        }
    };
    Ok(ok)
}
