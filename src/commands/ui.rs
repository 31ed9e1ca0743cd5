//! Interface commands: theme, studio

use crate::core::effect::Effect;
use crate::core::msg::{Control, Msg};
use crate::palette;

use super::{CommandResult, ShellOps};

/// Switch the color theme
pub fn theme(name: Option<&str>) -> CommandResult {
    let Some(name) = name else {
        return CommandResult::message(format!(
            "Themes: {}",
            palette::THEME_NAMES.join(", ")
        ));
    };
    let name = name.to_lowercase();
    if !palette::is_theme_name(&name) {
        return CommandResult::error(format!(
            "Unknown theme '{name}'. Themes: {}",
            palette::THEME_NAMES.join(", ")
        ));
    }
    CommandResult::effect(Effect::Emit(Msg::Control(Control::SwitchTheme(name))))
}

/// Activate a studio by name or one-based index
pub fn studio(ops: &mut dyn ShellOps, target: Option<&str>) -> CommandResult {
    let names = ops.studio_names();
    let Some(target) = target else {
        let active = ops.active_studio();
        let listing = names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let marker = if index == active { "*" } else { " " };
                format!("{marker}{} {name}", index + 1)
            })
            .collect::<Vec<_>>()
            .join("\n");
        return CommandResult::message(format!("Studios:\n{listing}"));
    };

    let index = match target.parse::<usize>() {
        Ok(number) if (1..=names.len()).contains(&number) => number - 1,
        Ok(_) => {
            return CommandResult::error(format!(
                "Studio index out of range. Expected 1-{}.",
                names.len()
            ));
        }
        Err(_) => {
            let wanted = target.to_lowercase();
            match names
                .iter()
                .position(|name| name.to_lowercase() == wanted)
            {
                Some(index) => index,
                None => {
                    return CommandResult::error(format!(
                        "Unknown studio '{target}'. Studios: {}",
                        names.join(", ")
                    ));
                }
            }
        }
    };
    CommandResult::effect(Effect::Emit(Msg::Control(Control::SwitchStudio(index))))
}

#[cfg(test)]
mod tests {
    use super::super::context::bench::BenchOps;
    use super::*;
    use pretty_assertions::assert_eq;

    fn switch_to(result: CommandResult) -> usize {
        match result.effects.as_slice() {
            [Effect::Emit(Msg::Control(Control::SwitchStudio(index)))] => *index,
            other => panic!("unexpected effects: {other:?}"),
        }
    }

    #[test]
    fn theme_switch_emits_a_control_message() {
        let result = theme(Some("Moon"));
        assert_eq!(
            result.effects,
            vec![Effect::Emit(Msg::Control(Control::SwitchTheme(
                "moon".to_string()
            )))]
        );
    }

    #[test]
    fn unknown_theme_is_an_inline_error() {
        let result = theme(Some("plasma"));
        assert!(result.message.expect("message").starts_with("Error:"));
    }

    #[test]
    fn studio_accepts_names_and_one_based_indexes() {
        let mut ops = BenchOps::default();
        assert_eq!(switch_to(studio(&mut ops, Some("node"))), 2);
        assert_eq!(switch_to(studio(&mut ops, Some("3"))), 2);
        assert_eq!(switch_to(studio(&mut ops, Some("Arcade"))), 4);
    }

    #[test]
    fn studio_rejects_out_of_range_index() {
        let mut ops = BenchOps::default();
        let result = studio(&mut ops, Some("9"));
        assert!(result.message.expect("message").contains("1-5"));
    }

    #[test]
    fn studio_listing_marks_the_active_entry() {
        let mut ops = BenchOps::default();
        ops.active = 1;
        let message = studio(&mut ops, None).message.expect("message");
        assert!(message.contains("*2 DevOps"));
        assert!(message.contains(" 1 LLM"));
    }
}
