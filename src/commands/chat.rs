//! Chat commands: model, system, context

use crate::core::effect::Effect;
use crate::core::msg::{Control, Msg};

use super::{CommandResult, ShellOps};

/// Switch or view the chat model
pub fn model(ops: &mut dyn ShellOps, name: Option<&str>) -> CommandResult {
    let models = ops.model_names();
    let Some(name) = name else {
        return CommandResult::message(format!(
            "Current model: {}\nAvailable: {}",
            ops.current_model(),
            models.join(", ")
        ));
    };
    if !models.iter().any(|model| model == name) {
        return CommandResult::error(format!(
            "Unknown model '{name}'. Available: {}",
            models.join(", ")
        ));
    }
    CommandResult::effect(Effect::Emit(Msg::Control(Control::SwitchModel(
        name.to_string(),
    ))))
}

/// Show or extend the system prompt
pub fn system(ops: &mut dyn ShellOps, text: Option<&str>) -> CommandResult {
    match text {
        None => CommandResult::message(format!(
            "System prompt: {}",
            ops.system_prompt().as_deref().unwrap_or("(none)")
        )),
        Some(text) => CommandResult::effect(Effect::Emit(Msg::Control(
            Control::InjectSystemText(text.to_string()),
        ))),
    }
}

/// Show or replace the external context block
pub fn context(ops: &mut dyn ShellOps, text: Option<&str>) -> CommandResult {
    match text {
        None => CommandResult::message(format!(
            "External context: {}",
            ops.external_context().as_deref().unwrap_or("(none)")
        )),
        Some(text) => CommandResult::effect(Effect::Emit(Msg::Control(
            Control::SetExternalContext(text.to_string()),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::super::context::bench::BenchOps;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn model_without_argument_lists_choices() {
        let mut ops = BenchOps::default();
        let message = model(&mut ops, None).message.expect("message");
        assert!(message.contains("hecate-large"));
        assert!(message.contains("hecate-coder"));
    }

    #[test]
    fn model_switch_round_trips_through_a_control_message() {
        let mut ops = BenchOps::default();
        let result = model(&mut ops, Some("hecate-small"));
        assert_eq!(
            result.effects,
            vec![Effect::Emit(Msg::Control(Control::SwitchModel(
                "hecate-small".to_string()
            )))]
        );
    }

    #[test]
    fn unknown_model_is_an_inline_error() {
        let mut ops = BenchOps::default();
        let result = model(&mut ops, Some("gpt-12"));
        assert!(result.message.expect("message").starts_with("Error:"));
        assert!(result.effects.is_empty());
    }

    #[test]
    fn system_text_becomes_an_inject_control() {
        let mut ops = BenchOps::default();
        let result = system(&mut ops, Some("talk like a pirate"));
        assert_eq!(
            result.effects,
            vec![Effect::Emit(Msg::Control(Control::InjectSystemText(
                "talk like a pirate".to_string()
            )))]
        );
    }

    #[test]
    fn context_without_argument_shows_current_value() {
        let mut ops = BenchOps::default();
        ops.external = Some("sprint 12 notes".to_string());
        let message = context(&mut ops, None).message.expect("message");
        assert!(message.contains("sprint 12 notes"));
    }
}
