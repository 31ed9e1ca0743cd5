//! Command registry and dispatch.
//!
//! Commands are organized by category and dispatched through a central
//! table. Handlers receive the capability context from [`context`] and
//! return messages plus effects; they never touch shell state directly.

mod chat;
pub mod context;
mod core;
pub mod history;
mod overlay;
mod ui;

pub use context::ShellOps;

use crate::core::effect::Effect;

/// Result of executing a command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    /// Optional message to display to the user.
    pub message: Option<String>,
    /// Effects for the shell to run.
    pub effects: Vec<Effect>,
}

impl CommandResult {
    /// Empty result: the command succeeded with no output.
    pub fn ok() -> Self {
        Self {
            message: None,
            effects: Vec::new(),
        }
    }

    /// A result with just a message.
    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            message: Some(msg.into()),
            effects: Vec::new(),
        }
    }

    /// A result with a single effect.
    pub fn effect(effect: Effect) -> Self {
        Self {
            message: None,
            effects: vec![effect],
        }
    }

    /// A result with both a message and an effect.
    pub fn with_message_and_effect(msg: impl Into<String>, effect: Effect) -> Self {
        Self {
            message: Some(msg.into()),
            effects: vec![effect],
        }
    }

    /// An inline error message result.
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: Some(format!("Error: {}", msg.into())),
            effects: Vec::new(),
        }
    }

    /// True when the message came from [`CommandResult::error`].
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.message
            .as_deref()
            .is_some_and(|message| message.starts_with("Error:"))
    }
}

/// Command metadata for help and completion.
#[derive(Debug, Clone, Copy)]
pub struct CommandInfo {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub usage: &'static str,
}

impl CommandInfo {
    pub fn takes_argument(&self) -> bool {
        self.usage.contains('<') || self.usage.contains('[')
    }
}

/// All registered commands.
pub const COMMANDS: &[CommandInfo] = &[
    // Core commands
    CommandInfo {
        name: "help",
        aliases: &["?"],
        description: "Show help information",
        usage: "/help [command]",
    },
    CommandInfo {
        name: "status",
        aliases: &[],
        description: "Show daemon health and connection details",
        usage: "/status",
    },
    CommandInfo {
        name: "clear",
        aliases: &[],
        description: "Clear the chat transcript",
        usage: "/clear",
    },
    CommandInfo {
        name: "note",
        aliases: &[],
        description: "Drop a note into the transcript",
        usage: "/note <text>",
    },
    CommandInfo {
        name: "quit",
        aliases: &["exit", "q"],
        description: "Quit hecate",
        usage: "/quit",
    },
    // Chat commands
    CommandInfo {
        name: "model",
        aliases: &[],
        description: "Switch or view the chat model",
        usage: "/model [name]",
    },
    CommandInfo {
        name: "system",
        aliases: &[],
        description: "Show or extend the system prompt",
        usage: "/system [text]",
    },
    CommandInfo {
        name: "context",
        aliases: &[],
        description: "Show or replace the external context block",
        usage: "/context [text]",
    },
    // Interface commands
    CommandInfo {
        name: "theme",
        aliases: &[],
        description: "Switch the color theme",
        usage: "/theme [name]",
    },
    CommandInfo {
        name: "studio",
        aliases: &[],
        description: "Activate a studio by name or index",
        usage: "/studio [name]",
    },
    // Overlay commands
    CommandInfo {
        name: "browse",
        aliases: &[],
        description: "Browse past conversations",
        usage: "/browse",
    },
    CommandInfo {
        name: "pair",
        aliases: &[],
        description: "Pair this client with the daemon",
        usage: "/pair",
    },
    CommandInfo {
        name: "edit",
        aliases: &["e"],
        description: "Edit a file in the overlay editor",
        usage: "/edit <path>",
    },
    CommandInfo {
        name: "form",
        aliases: &[],
        description: "Fill in a named form",
        usage: "/form <type>",
    },
];

/// Execute a command line. The line arrives with its prompt character
/// still attached.
pub fn execute(line: &str, ops: &mut dyn ShellOps) -> CommandResult {
    let parts: Vec<&str> = line.trim().splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let command = command.strip_prefix(['/', ':']).unwrap_or(&command);
    let arg = parts.get(1).map(|s| s.trim()).filter(|s| !s.is_empty());

    match command {
        // Core commands
        "help" | "?" => core::help(arg),
        "status" => core::status(ops),
        "clear" => core::clear(ops),
        "note" => core::note(ops, arg),
        "quit" | "exit" | "q" => core::quit(),

        // Chat commands
        "model" => chat::model(ops, arg),
        "system" => chat::system(ops, arg),
        "context" => chat::context(ops, arg),

        // Interface commands
        "theme" => ui::theme(arg),
        "studio" => ui::studio(ops, arg),

        // Overlay commands
        "browse" => overlay::browse(),
        "pair" => overlay::pair(),
        "edit" | "e" => overlay::edit(arg),
        "form" => overlay::form(arg),

        "" => CommandResult::ok(),
        _ => CommandResult::error(format!(
            "Unknown command: /{command}. Type /help for available commands."
        )),
    }
}

/// Look up command metadata by name or alias.
pub fn get_command_info(name: &str) -> Option<&'static CommandInfo> {
    let name = name.strip_prefix(['/', ':']).unwrap_or(name);
    COMMANDS
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// All commands matching a name prefix.
pub fn commands_matching(prefix: &str) -> Vec<&'static CommandInfo> {
    let prefix = prefix.strip_prefix(['/', ':']).unwrap_or(prefix).to_lowercase();
    COMMANDS
        .iter()
        .filter(|cmd| {
            cmd.name.starts_with(&prefix) || cmd.aliases.iter().any(|a| a.starts_with(&prefix))
        })
        .collect()
}

/// Two-level completion over the command-line content (prompt character
/// excluded). Before the first space, candidates are command names; after
/// it, the matched command's own argument rule decides.
pub fn complete(input: &str, ops: &dyn ShellOps) -> Vec<String> {
    match input.split_once(' ') {
        None => commands_matching(input)
            .into_iter()
            .map(|cmd| {
                if cmd.takes_argument() {
                    format!("{} ", cmd.name)
                } else {
                    cmd.name.to_string()
                }
            })
            .collect(),
        Some((head, rest)) => {
            let Some(info) = get_command_info(head) else {
                return Vec::new();
            };
            argument_candidates(info.name, rest.trim_start(), ops)
                .into_iter()
                .map(|candidate| format!("{head} {candidate}"))
                .collect()
        }
    }
}

/// Argument completion, command by command.
fn argument_candidates(command: &str, prefix: &str, ops: &dyn ShellOps) -> Vec<String> {
    let prefix = prefix.to_lowercase();
    let filter = |names: Vec<String>| -> Vec<String> {
        names
            .into_iter()
            .filter(|name| name.to_lowercase().starts_with(&prefix))
            .collect()
    };
    match command {
        "model" => filter(ops.model_names()),
        "studio" => filter(ops.studio_names()),
        "theme" => filter(
            crate::palette::THEME_NAMES
                .iter()
                .map(ToString::to_string)
                .collect(),
        ),
        "form" => filter(
            crate::tui::overlay::FORM_TYPES
                .iter()
                .map(ToString::to_string)
                .collect(),
        ),
        "help" => filter(COMMANDS.iter().map(|cmd| cmd.name.to_string()).collect()),
        _ => Vec::new(),
    }
}
