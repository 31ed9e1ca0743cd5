//! Core commands: help, status, clear, note, quit

use std::fmt::Write;

use crate::core::effect::Effect;

use super::{CommandResult, ShellOps};

/// Show help information
pub fn help(topic: Option<&str>) -> CommandResult {
    if let Some(topic) = topic {
        if let Some(cmd) = super::get_command_info(topic) {
            let mut help = format!(
                "{}\n\n  {}\n\n  Usage: {}",
                cmd.name, cmd.description, cmd.usage
            );
            if !cmd.aliases.is_empty() {
                let _ = write!(help, "\n  Aliases: {}", cmd.aliases.join(", "));
            }
            return CommandResult::message(help);
        }
        return CommandResult::error(format!("Unknown command: {topic}"));
    }

    let mut help = String::from("Commands:\n");
    for cmd in super::COMMANDS {
        let _ = writeln!(help, "  {:<18} {}", cmd.usage, cmd.description);
    }
    help.push_str("\nUp/Down browse history, Tab completes, Esc cancels.");
    CommandResult::message(help)
}

/// Show daemon health and connection details
pub fn status(ops: &mut dyn ShellOps) -> CommandResult {
    let studios = ops.studio_names();
    let active = ops.active_studio();
    let studio = studios
        .get(active)
        .cloned()
        .unwrap_or_else(|| "?".to_string());
    CommandResult::message(format!(
        "Daemon:    {}\nTransport: {}\nModel:     {}\nStudio:    {} ({}/{})\nTheme:     {}",
        ops.health().label(),
        ops.transport_label(),
        ops.current_model(),
        studio,
        active + 1,
        studios.len(),
        ops.theme(),
    ))
}

/// Clear the chat transcript
pub fn clear(ops: &mut dyn ShellOps) -> CommandResult {
    ops.clear_transcript();
    CommandResult::message("Transcript cleared")
}

/// Drop a note into the transcript
pub fn note(ops: &mut dyn ShellOps, text: Option<&str>) -> CommandResult {
    let Some(text) = text else {
        return CommandResult::error("Usage: /note <text>");
    };
    ops.push_note(text);
    CommandResult::ok()
}

/// Quit the application
pub fn quit() -> CommandResult {
    CommandResult::effect(Effect::Quit)
}
