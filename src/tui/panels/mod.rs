//! Studio panels and the router that owns them.
//!
//! Exactly one studio is active at a time. The router forwards messages to
//! that studio only; the others stay frozen until focused again. Operations
//! the shell needs from a specific studio (transcript writes, chat
//! progress) live on the [`Panel`] trait with no-op defaults, so nothing
//! ever downcasts a `Box<dyn Panel>`.

pub mod arcade;
pub mod chat;
pub mod devops;
pub mod node;
pub mod social;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Widget};

use crate::client::ChatEvent;
use crate::core::effect::Effect;
use crate::core::msg::Msg;
use crate::palette::UiTheme;

/// Studio positions in the router's ordered collection.
pub const LLM: usize = 0;
pub const DEVOPS: usize = 1;
pub const NODE: usize = 2;
pub const SOCIAL: usize = 3;
pub const ARCADE: usize = 4;

/// Capability set every studio implements. Default bodies make the
/// chat-specific operations no-ops everywhere else.
pub trait Panel {
    fn name(&self) -> &'static str;

    /// First-activation work, run exactly once per panel.
    fn init(&mut self) -> Vec<Effect> {
        Vec::new()
    }

    /// A message forwarded by the shell. Only ever called on the active
    /// panel.
    fn receive(&mut self, msg: &Msg) -> Vec<Effect> {
        let _ = msg;
        Vec::new()
    }

    fn resize(&mut self, width: u16, height: u16) {
        let _ = (width, height);
    }

    /// One-line status fragment for the footer.
    fn status(&self) -> String {
        String::new()
    }

    fn focus(&mut self) {}
    fn blur(&mut self) {}

    fn render(&self, area: Rect, buf: &mut Buffer, theme: &UiTheme);

    // Chat operations, addressed to the LLM studio by the shell.
    fn absorb_chat(&mut self, event: &ChatEvent) {
        let _ = event;
    }
    fn note(&mut self, text: &str) {
        let _ = text;
    }
    fn clear(&mut self) {}
    fn push_prompt(&mut self, text: &str) {
        let _ = text;
    }
    fn set_conversation(&mut self, id: String, title: String) {
        let _ = (id, title);
    }
    fn conversation(&self) -> Option<String> {
        None
    }
}

/// Map a fact type to the studio that handles it. Unprefixed types have no
/// home and surface as a notice instead.
#[must_use]
pub fn studio_for_fact(fact_type: &str) -> Option<usize> {
    let head = fact_type.split('.').next().unwrap_or(fact_type);
    match head {
        "llm" => Some(LLM),
        "ops" => Some(DEVOPS),
        "node" => Some(NODE),
        "social" => Some(SOCIAL),
        "arcade" => Some(ARCADE),
        _ => None,
    }
}

/// The five studios in tab order.
#[must_use]
pub fn default_studios() -> Vec<Box<dyn Panel>> {
    vec![
        Box::new(chat::LlmStudio::default()),
        Box::new(devops::DevOpsStudio::default()),
        Box::new(node::NodeStudio::default()),
        Box::new(social::SocialStudio::default()),
        Box::new(arcade::ArcadeStudio::default()),
    ]
}

/// Render the newest lines that fit, oldest scrolled off the top.
pub(crate) fn render_tail(lines: Vec<Line>, area: Rect, buf: &mut Buffer) {
    let height = area.height as usize;
    let top = lines.len().saturating_sub(height);
    Paragraph::new(lines[top..].to_vec()).render(area, buf);
}

// === Router ===

pub struct PanelRouter {
    panels: Vec<Box<dyn Panel>>,
    active: usize,
    initialized: Vec<bool>,
}

impl PanelRouter {
    /// Build the router with `active` restored from settings. The restored
    /// studio is focused and initialized immediately; no persist effect is
    /// produced because the index did not change.
    pub fn new(panels: Vec<Box<dyn Panel>>, active: usize) -> (Self, Vec<Effect>) {
        let active = active.min(panels.len().saturating_sub(1));
        let initialized = vec![false; panels.len()];
        let mut router = Self {
            panels,
            active,
            initialized,
        };
        let effects = router.activate(active);
        (router, effects)
    }

    fn activate(&mut self, index: usize) -> Vec<Effect> {
        self.panels[index].focus();
        if self.initialized[index] {
            return Vec::new();
        }
        self.initialized[index] = true;
        self.panels[index].init()
    }

    /// Switch the active studio. Unfocus, move the index, focus, persist,
    /// then run the newcomer's init if it has never been active before.
    /// Switching to the already-active studio is a no-op.
    pub fn switch(&mut self, index: usize) -> Vec<Effect> {
        if index >= self.panels.len() || index == self.active {
            return Vec::new();
        }
        self.panels[self.active].blur();
        self.active = index;
        let mut effects = vec![Effect::PersistActivePanel(index)];
        effects.extend(self.activate(index));
        effects
    }

    /// Forward a message to the active studio only.
    pub fn forward(&mut self, msg: &Msg) -> Vec<Effect> {
        self.panels[self.active].receive(msg)
    }

    pub fn resize_active(&mut self, width: u16, height: u16) {
        self.panels[self.active].resize(width, height);
    }

    #[must_use]
    pub fn active(&self) -> usize {
        self.active
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.panels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.panels.iter().map(|panel| panel.name()).collect()
    }

    #[must_use]
    pub fn active_panel(&self) -> &dyn Panel {
        self.panels[self.active].as_ref()
    }

    /// Addressed access for operations that target one studio no matter
    /// which is focused, like chat progress landing in the LLM studio.
    pub fn panel_mut(&mut self, index: usize) -> &mut dyn Panel {
        self.panels[index].as_mut()
    }
}
