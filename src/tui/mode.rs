//! Modal interaction state and the key classifier.
//!
//! Exactly one mode is active at a time. Every mutation goes through
//! [`ModeState`], which also remembers the previous mode for single-level
//! return. The classifier decides, for every key in every mode, whether the
//! shell consumes the key or forwards it to the focused surface; a key is
//! never given to both.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

// === Mode ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Insert,
    Command,
    Browse,
    Pair,
    Edit,
    Form,
}

impl Mode {
    /// Status bar label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::Command => "COMMAND",
            Mode::Browse => "BROWSE",
            Mode::Pair => "PAIR",
            Mode::Edit => "EDIT",
            Mode::Form => "FORM",
        }
    }

    /// Modes whose surface is a modal sub-view over the base content.
    #[must_use]
    pub fn is_overlay(self) -> bool {
        matches!(self, Mode::Browse | Mode::Pair | Mode::Edit | Mode::Form)
    }

    /// Insert and only Insert shows the free-text composer.
    #[must_use]
    pub fn shows_composer(self) -> bool {
        self == Mode::Insert
    }

    /// Command and only Command shows the command line.
    #[must_use]
    pub fn shows_command_line(self) -> bool {
        self == Mode::Command
    }
}

// === Transitions ===

/// The one place mode changes happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeState {
    current: Mode,
    previous: Mode,
    /// Prompt character that opened Command mode.
    prompt: char,
}

impl Default for ModeState {
    fn default() -> Self {
        Self {
            current: Mode::Normal,
            previous: Mode::Normal,
            prompt: '/',
        }
    }
}

impl ModeState {
    #[must_use]
    pub fn current(&self) -> Mode {
        self.current
    }

    #[must_use]
    pub fn previous(&self) -> Mode {
        self.previous
    }

    #[must_use]
    pub fn prompt(&self) -> char {
        self.prompt
    }

    /// Move to `next`. Entering the mode already active changes nothing,
    /// so `previous` always differs from `current` after a real change.
    pub fn enter(&mut self, next: Mode) {
        if next != self.current {
            self.previous = self.current;
            self.current = next;
        }
    }

    /// Enter Command mode, recording which prompt character opened it.
    pub fn enter_command(&mut self, prompt: char) {
        self.prompt = prompt;
        self.enter(Mode::Command);
    }

    /// Single-level return to the mode before the last change.
    pub fn back(&mut self) {
        let current = self.current;
        self.current = self.previous;
        self.previous = current;
    }
}

// === Key classifier ===

/// What happens to one key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// The shell acts on the key itself.
    Consumed,
    /// The key goes to the focused surface: the active overlay in overlay
    /// modes, the active panel otherwise.
    Forwarded,
}

/// Shell facts the classifier needs beyond the mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifierCtx {
    /// The startup home screen is up and swallowing everything.
    pub home_visible: bool,
    /// A chat response is streaming, so Esc means cancel.
    pub chat_in_flight: bool,
}

/// Decide the fate of a key press. Total over (mode, key, ctx): every input
/// maps to exactly one disposition.
#[must_use]
pub fn classify(mode: Mode, key: &KeyEvent, ctx: ClassifierCtx) -> KeyDisposition {
    if is_interrupt(key) {
        return KeyDisposition::Consumed;
    }
    if ctx.home_visible {
        return KeyDisposition::Consumed;
    }
    match mode {
        Mode::Normal => match key.code {
            KeyCode::Char('q' | 'i' | '/' | ':') if key.modifiers.is_empty() => {
                KeyDisposition::Consumed
            }
            KeyCode::Char(c) if c.is_ascii_digit() && key.modifiers.is_empty() => {
                KeyDisposition::Consumed
            }
            KeyCode::Tab => KeyDisposition::Consumed,
            KeyCode::Esc if ctx.chat_in_flight => KeyDisposition::Consumed,
            _ => KeyDisposition::Forwarded,
        },
        // The composer and the command line are shell-owned widgets.
        Mode::Insert | Mode::Command => KeyDisposition::Consumed,
        // Overlays get first refusal on every key, Esc included.
        Mode::Browse | Mode::Pair | Mode::Edit | Mode::Form => KeyDisposition::Forwarded,
    }
}

/// Ctrl+C quits from anywhere.
#[must_use]
pub fn is_interrupt(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ALL_MODES: [Mode; 7] = [
        Mode::Normal,
        Mode::Insert,
        Mode::Command,
        Mode::Browse,
        Mode::Pair,
        Mode::Edit,
        Mode::Form,
    ];

    fn sample_keys() -> Vec<KeyEvent> {
        let mut keys = Vec::new();
        for c in "qijk/:19 xZ?".chars() {
            keys.push(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        keys.push(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        keys.push(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        for code in [
            KeyCode::Esc,
            KeyCode::Enter,
            KeyCode::Tab,
            KeyCode::Backspace,
            KeyCode::Up,
            KeyCode::Down,
            KeyCode::Left,
            KeyCode::Right,
            KeyCode::Home,
            KeyCode::End,
            KeyCode::PageUp,
            KeyCode::F(2),
        ] {
            keys.push(KeyEvent::new(code, KeyModifiers::NONE));
        }
        keys
    }

    #[test]
    fn classifier_is_deterministic_over_the_whole_table() {
        let contexts = [
            ClassifierCtx::default(),
            ClassifierCtx {
                home_visible: true,
                chat_in_flight: false,
            },
            ClassifierCtx {
                home_visible: false,
                chat_in_flight: true,
            },
        ];
        for mode in ALL_MODES {
            for key in sample_keys() {
                for ctx in contexts {
                    let first = classify(mode, &key, ctx);
                    let second = classify(mode, &key, ctx);
                    assert_eq!(first, second, "mode {mode:?} key {key:?}");
                }
            }
        }
    }

    #[test]
    fn interrupt_is_consumed_everywhere() {
        let interrupt = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        for mode in ALL_MODES {
            assert_eq!(
                classify(mode, &interrupt, ClassifierCtx::default()),
                KeyDisposition::Consumed
            );
        }
    }

    #[test]
    fn home_screen_swallows_every_key() {
        let ctx = ClassifierCtx {
            home_visible: true,
            chat_in_flight: false,
        };
        for key in sample_keys() {
            assert_eq!(
                classify(Mode::Normal, &key, ctx),
                KeyDisposition::Consumed,
                "key {key:?}"
            );
        }
    }

    #[test]
    fn normal_mode_consumes_shell_keys_and_forwards_the_rest() {
        let ctx = ClassifierCtx::default();
        for (code, expected) in [
            (KeyCode::Char('q'), KeyDisposition::Consumed),
            (KeyCode::Char('i'), KeyDisposition::Consumed),
            (KeyCode::Char('/'), KeyDisposition::Consumed),
            (KeyCode::Char(':'), KeyDisposition::Consumed),
            (KeyCode::Char('3'), KeyDisposition::Consumed),
            (KeyCode::Tab, KeyDisposition::Consumed),
            (KeyCode::Char('j'), KeyDisposition::Forwarded),
            (KeyCode::Esc, KeyDisposition::Forwarded),
            (KeyCode::PageUp, KeyDisposition::Forwarded),
        ] {
            let key = KeyEvent::new(code, KeyModifiers::NONE);
            assert_eq!(classify(Mode::Normal, &key, ctx), expected, "key {code:?}");
        }
    }

    #[test]
    fn esc_in_normal_cancels_a_streaming_response() {
        let ctx = ClassifierCtx {
            home_visible: false,
            chat_in_flight: true,
        };
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(classify(Mode::Normal, &esc, ctx), KeyDisposition::Consumed);
    }

    #[test]
    fn insert_and_command_consume_everything() {
        let ctx = ClassifierCtx::default();
        for mode in [Mode::Insert, Mode::Command] {
            for key in sample_keys() {
                assert_eq!(
                    classify(mode, &key, ctx),
                    KeyDisposition::Consumed,
                    "mode {mode:?} key {key:?}"
                );
            }
        }
    }

    #[test]
    fn overlay_modes_forward_for_first_refusal() {
        let ctx = ClassifierCtx::default();
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        for mode in [Mode::Browse, Mode::Pair, Mode::Edit, Mode::Form] {
            assert_eq!(classify(mode, &esc, ctx), KeyDisposition::Forwarded);
        }
    }

    #[test]
    fn transitions_remember_one_level() {
        let mut state = ModeState::default();
        assert_eq!(state.current(), Mode::Normal);

        state.enter(Mode::Insert);
        assert_eq!(state.current(), Mode::Insert);
        assert_eq!(state.previous(), Mode::Normal);

        state.back();
        assert_eq!(state.current(), Mode::Normal);
    }

    #[test]
    fn reentering_the_active_mode_is_a_no_op() {
        let mut state = ModeState::default();
        state.enter(Mode::Edit);
        state.enter(Mode::Edit);
        assert_eq!(state.previous(), Mode::Normal);
    }

    #[test]
    fn command_entry_records_the_prompt_character() {
        let mut state = ModeState::default();
        state.enter_command(':');
        assert_eq!(state.current(), Mode::Command);
        assert_eq!(state.prompt(), ':');
    }
}
