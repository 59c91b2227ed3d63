//! CLI argument parsing via clap.

use clap::{Parser, Subcommand};

/// Chat with a streaming agent in a room, and save or describe its draft.
#[derive(Debug, Parser)]
#[command(name = "agentroom", version)]
pub struct Args {
    /// Path to config file (default: ./agentroom.toml or ~/.config/agentroom/agentroom.toml).
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,

    /// Agent draft file (TOML with the agent record's field names).
    #[arg(short = 'a', long = "agent", global = true, value_name = "FILE")]
    pub agent: Option<String>,

    /// Id of a saved agent; overrides the id in the draft file.
    #[arg(long = "agent-id", global = true)]
    pub agent_id: Option<String>,

    /// Disable color output.
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Start a run and chat from stdin (default).
    ///
    /// In-chat commands: /stop cancels the response, /restart starts over,
    /// /quit leaves.
    Chat,
    /// Validate and save the agent draft.
    Save,
    /// Generate a description for the agent draft.
    Describe {
        /// Save the draft after generating.
        #[arg(long)]
        save: bool,
    },
}

impl Args {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }
}

/// A line typed during chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Turn(String),
    Stop,
    Restart,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_chat_input(line: &str) -> ChatInput {
    let trimmed = line.trim();
    match trimmed {
        "" => ChatInput::Empty,
        "/stop" => ChatInput::Stop,
        "/restart" => ChatInput::Restart,
        "/quit" | "/exit" => ChatInput::Quit,
        cmd if cmd.starts_with('/') => ChatInput::Unknown(cmd.to_string()),
        _ => ChatInput::Turn(trimmed.to_string()),
    }
}
