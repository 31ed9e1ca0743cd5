//! Overlay commands: browse, pair, edit, form
//!
//! Each one emits an open-overlay control message; the shell's mode
//! transition decides whether the prerequisites hold. Missing arguments are
//! caught here so a half-formed request never reaches the transition.

use std::path::PathBuf;

use crate::core::effect::Effect;
use crate::core::msg::{Control, Msg, OverlayRequest};
use crate::tui::overlay::FORM_TYPES;

use super::CommandResult;

fn open(request: OverlayRequest) -> CommandResult {
    CommandResult::effect(Effect::Emit(Msg::Control(Control::OpenOverlay(request))))
}

/// Browse past conversations
pub fn browse() -> CommandResult {
    open(OverlayRequest::Browse)
}

/// Pair this client with the daemon
pub fn pair() -> CommandResult {
    open(OverlayRequest::Pair)
}

/// Edit a file in the overlay editor
pub fn edit(path: Option<&str>) -> CommandResult {
    let Some(path) = path else {
        return CommandResult::error("Usage: /edit <path>");
    };
    open(OverlayRequest::Edit {
        path: PathBuf::from(path),
    })
}

/// Fill in a named form
pub fn form(name: Option<&str>) -> CommandResult {
    let Some(name) = name else {
        return CommandResult::error(format!(
            "Usage: /form <type>. Types: {}",
            FORM_TYPES.join(", ")
        ));
    };
    let name = name.to_lowercase();
    if !FORM_TYPES.contains(&name.as_str()) {
        return CommandResult::error(format!(
            "Unknown form '{name}'. Types: {}",
            FORM_TYPES.join(", ")
        ));
    }
    open(OverlayRequest::Form { form: name })
}
