//! The shell: one state value, one `update` function.
//!
//! Every message from every source goes through [`Shell::update`] on the UI
//! task, one at a time. `update` never blocks and never performs I/O;
//! anything slow is described as an [`Effect`] and run by the driver off
//! the loop, with the outcome fed back in as a later message. Nothing else
//! mutates shell state, so there is no locking anywhere in this module.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::client::{ChatEvent, ChatRequest, HealthStatus};
use crate::commands::{self, history::CommandHistory, ShellOps};
use crate::config::{Config, Settings};
use crate::core::effect::Effect;
use crate::core::msg::{Control, Msg, OverlayRequest, Timer};
use crate::facts::Fact;
use crate::palette::{self, UiTheme};
use crate::tui::mode::{self, ClassifierCtx, KeyDisposition, Mode, ModeState};
use crate::tui::overlay::{
    BrowseOverlay, EditOverlay, FormOverlay, Overlay, OverlayAction, PairOverlay,
};
use crate::tui::panels::{self, PanelRouter};

/// How long a flash notice stays up.
const FLASH_TTL: Duration = Duration::from_secs(5);
/// Command output can run to several lines; give it longer.
const COMMAND_FLASH_TTL: Duration = Duration::from_secs(12);

// === Flash notices ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Info,
    Warn,
    Error,
}

/// A transient notice above the status bar. The id lets a stale clear
/// timer expire harmlessly after a newer flash replaced the text.
#[derive(Debug, Clone, PartialEq)]
pub struct Flash {
    pub id: u64,
    pub level: FlashLevel,
    pub text: String,
}

// === Shell ===

pub struct Shell {
    mode: ModeState,
    overlay: Overlay,
    router: PanelRouter,
    command: String,
    history: CommandHistory,
    composer: String,
    model: String,
    models: Vec<String>,
    system_prompt: Option<String>,
    external_context: Option<String>,
    health: HealthStatus,
    transport_label: String,
    theme_name: String,
    flash: Option<Flash>,
    flash_seq: u64,
    home_visible: bool,
    chat_in_flight: bool,
}

impl Shell {
    /// Build the shell and the effects that boot it: one health probe plus
    /// its recurring timer, the fact subscription, and the first fact poll.
    pub fn new(
        config: Config,
        settings: &Settings,
        transport_label: String,
    ) -> (Self, Vec<Effect>) {
        let (router, router_effects) =
            PanelRouter::new(panels::default_studios(), settings.active_studio);
        let shell = Self {
            mode: ModeState::default(),
            overlay: Overlay::None,
            router,
            command: String::new(),
            history: CommandHistory::default(),
            composer: String::new(),
            model: config.model,
            models: config.models,
            system_prompt: config.system,
            external_context: None,
            health: HealthStatus::Unknown,
            transport_label,
            theme_name: settings.theme.clone(),
            flash: None,
            flash_seq: 0,
            home_visible: true,
            chat_in_flight: false,
        };
        let mut effects = vec![
            Effect::Probe,
            Effect::health_tick(),
            Effect::SubscribeFacts,
            Effect::PollFacts,
        ];
        effects.extend(router_effects);
        (shell, effects)
    }

    /// Absorb one message and return the work it caused.
    pub fn update(&mut self, msg: Msg) -> Vec<Effect> {
        match msg {
            Msg::Resize { width, height } => {
                self.router.resize_active(width, height);
                Vec::new()
            }
            Msg::Key(key) => self.on_key(key),
            Msg::Timer(timer) => self.on_timer(timer),
            Msg::ProbeResult(status) => {
                self.health = status;
                Vec::new()
            }
            Msg::FactReceived(fact) => self.on_fact(fact),
            Msg::FactStreamContinue => vec![Effect::PollFacts],
            Msg::FactStreamDisconnected => {
                tracing::debug!("fact producer detached; polling stops");
                Vec::new()
            }
            Msg::Chat(event) => self.on_chat(event),
            msg @ Msg::ConversationsLoaded(_) => {
                if self.overlay.absorb(&msg) {
                    return Vec::new();
                }
                if let Msg::ConversationsLoaded(Err(error)) = msg {
                    return vec![self.flash(FlashLevel::Warn, format!("Conversations: {error}"))];
                }
                Vec::new()
            }
            msg @ Msg::PairingReady(_) => {
                if self.overlay.absorb(&msg) {
                    return Vec::new();
                }
                if let Msg::PairingReady(Err(error)) = msg {
                    return vec![self.flash(FlashLevel::Warn, format!("Pairing: {error}"))];
                }
                Vec::new()
            }
            Msg::FileLoaded { path, result } => match result {
                Ok(contents) => {
                    if self.mode.current().is_overlay() {
                        // Another overlay opened while the read was in
                        // flight; drop this one.
                        return Vec::new();
                    }
                    self.overlay = Overlay::Edit(EditOverlay::new(path, &contents));
                    self.mode.enter(Mode::Edit);
                    Vec::new()
                }
                Err(error) => vec![self.flash(
                    FlashLevel::Error,
                    format!("Cannot edit {}: {error}", path.display()),
                )],
            },
            msg @ Msg::FileSaved { .. } => {
                if self.overlay.absorb(&msg) {
                    return Vec::new();
                }
                // The editor closed before the write finished.
                let Msg::FileSaved { path, result } = msg else {
                    return Vec::new();
                };
                match result {
                    Ok(()) => {
                        vec![self.flash(FlashLevel::Info, format!("Saved {}", path.display()))]
                    }
                    Err(error) => vec![self.flash(
                        FlashLevel::Error,
                        format!("Save failed for {}: {error}", path.display()),
                    )],
                }
            }
            Msg::Control(control) => self.on_control(control),
        }
    }

    // === Keys ===

    fn classifier_ctx(&self) -> ClassifierCtx {
        ClassifierCtx {
            home_visible: self.home_visible,
            chat_in_flight: self.chat_in_flight,
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match mode::classify(self.mode.current(), &key, self.classifier_ctx()) {
            KeyDisposition::Consumed => self.consume_key(key),
            KeyDisposition::Forwarded => self.forward_key(key),
        }
    }

    fn consume_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if mode::is_interrupt(&key) {
            return vec![Effect::Quit];
        }
        if self.home_visible {
            if key.code == KeyCode::Char('q') {
                return vec![Effect::Quit];
            }
            self.home_visible = false;
            return Vec::new();
        }
        match self.mode.current() {
            Mode::Normal => self.on_normal_key(key),
            Mode::Insert => self.on_insert_key(key),
            Mode::Command => self.on_command_key(key),
            // Overlay-mode keys are forwarded by the classifier and never
            // reach here.
            Mode::Browse | Mode::Pair | Mode::Edit | Mode::Form => Vec::new(),
        }
    }

    fn forward_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if self.mode.current().is_overlay() {
            let action = self.overlay.handle_key(key);
            return self.run_overlay_action(action);
        }
        self.router.forward(&Msg::Key(key))
    }

    fn on_normal_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Char('q') => vec![Effect::Quit],
            KeyCode::Char('i') => {
                self.mode.enter(Mode::Insert);
                Vec::new()
            }
            KeyCode::Char(prompt @ ('/' | ':')) => {
                self.command.clear();
                self.history.reset();
                self.mode.enter_command(prompt);
                Vec::new()
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let slot = c.to_digit(10).unwrap_or(0) as usize;
                if (1..=self.router.len()).contains(&slot) {
                    self.router.switch(slot - 1)
                } else {
                    Vec::new()
                }
            }
            KeyCode::Tab => {
                let next = (self.router.active() + 1) % self.router.len();
                self.router.switch(next)
            }
            KeyCode::Esc if self.chat_in_flight => self.cancel_chat(),
            _ => Vec::new(),
        }
    }

    fn on_insert_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            // The draft survives leaving Insert mode.
            KeyCode::Esc => {
                self.mode.back();
                Vec::new()
            }
            KeyCode::Enter => self.submit_prompt(),
            KeyCode::Backspace => {
                self.composer.pop();
                Vec::new()
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.composer.push(c);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn on_command_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Esc => {
                self.command.clear();
                self.history.reset();
                self.mode.back();
                Vec::new()
            }
            KeyCode::Enter => self.dispatch_command(),
            KeyCode::Up => {
                if let Some(recalled) = self.history.previous(&self.command) {
                    self.command = recalled;
                }
                Vec::new()
            }
            KeyCode::Down => {
                if let Some(next) = self.history.next() {
                    self.command = next;
                }
                Vec::new()
            }
            KeyCode::Tab => self.complete_command(),
            KeyCode::Backspace => {
                self.command.pop();
                Vec::new()
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.command.push(c);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    // === Chat ===

    fn submit_prompt(&mut self) -> Vec<Effect> {
        let message = self.composer.trim().to_string();
        if message.is_empty() {
            return Vec::new();
        }
        if self.chat_in_flight {
            return vec![self.flash(
                FlashLevel::Warn,
                "A response is still streaming. Esc cancels it.",
            )];
        }
        self.composer.clear();
        self.mode.enter(Mode::Normal);
        let conversation = {
            let llm = self.router.panel_mut(panels::LLM);
            llm.push_prompt(&message);
            llm.conversation()
        };
        let request = ChatRequest {
            conversation,
            message,
            model: self.model.clone(),
            system: self.effective_system(),
        };
        self.chat_in_flight = true;
        vec![Effect::SendChat(request)]
    }

    fn effective_system(&self) -> Option<String> {
        match (&self.system_prompt, &self.external_context) {
            (None, None) => None,
            (Some(system), None) => Some(system.clone()),
            (None, Some(context)) => Some(format!("Context:\n{context}")),
            (Some(system), Some(context)) => Some(format!("{system}\n\nContext:\n{context}")),
        }
    }

    fn cancel_chat(&mut self) -> Vec<Effect> {
        self.chat_in_flight = false;
        self.router
            .panel_mut(panels::LLM)
            .absorb_chat(&ChatEvent::Failed {
                message: "cancelled".to_string(),
            });
        vec![Effect::CancelChat]
    }

    fn on_chat(&mut self, event: ChatEvent) -> Vec<Effect> {
        if matches!(event, ChatEvent::Done | ChatEvent::Failed { .. }) {
            self.chat_in_flight = false;
        }
        // Addressed delivery: the response belongs to the LLM studio even
        // while another studio is focused.
        self.router.panel_mut(panels::LLM).absorb_chat(&event);
        Vec::new()
    }

    // === Commands ===

    fn dispatch_command(&mut self) -> Vec<Effect> {
        let entry = self.command.trim().to_string();
        let line = format!("{}{entry}", self.mode.prompt());
        self.command.clear();
        self.mode.back();
        if entry.is_empty() {
            return Vec::new();
        }
        self.history.push(&entry);
        let result = commands::execute(&line, self);
        let mut effects = Vec::new();
        if let Some(message) = result.message.clone() {
            let level = if result.is_error() {
                FlashLevel::Error
            } else {
                FlashLevel::Info
            };
            effects.push(self.flash_with_ttl(level, message, COMMAND_FLASH_TTL));
        }
        effects.extend(result.effects);
        effects
    }

    fn complete_command(&mut self) -> Vec<Effect> {
        let candidates = commands::complete(&self.command, self);
        match candidates.as_slice() {
            [] => Vec::new(),
            [only] => {
                self.command = only.clone();
                Vec::new()
            }
            many => {
                if let Some(prefix) = longest_common_prefix(many) {
                    if prefix.chars().count() > self.command.chars().count() {
                        self.command = prefix;
                    }
                }
                let list = many.join("  ");
                vec![self.flash(FlashLevel::Info, list)]
            }
        }
    }

    // === Facts ===

    fn on_fact(&mut self, fact: Fact) -> Vec<Effect> {
        // Keep draining: the queue may hold more.
        let mut effects = vec![Effect::PollFacts];
        if self.overlay.absorb(&Msg::FactReceived(fact.clone())) {
            return effects;
        }
        if fact.is_malformed() {
            let detail = fact
                .data
                .get("error")
                .and_then(|value| value.as_str())
                .unwrap_or("unparseable payload")
                .to_string();
            effects.push(self.flash(FlashLevel::Warn, format!("Dropped a malformed fact: {detail}")));
            return effects;
        }
        match panels::studio_for_fact(&fact.fact_type) {
            Some(target) if target == self.router.active() => {
                effects.extend(self.router.forward(&Msg::FactReceived(fact)));
            }
            Some(target) => {
                // Inactive studios stay frozen; the arrival becomes a
                // notice instead.
                let name = self.router.names().get(target).copied().unwrap_or("studio");
                effects.push(self.flash(FlashLevel::Info, format!("{name}: {}", fact.fact_type)));
            }
            None => {
                effects.push(self.flash(FlashLevel::Info, format!("fact: {}", fact.fact_type)));
            }
        }
        effects
    }

    // === Timers ===

    fn on_timer(&mut self, timer: Timer) -> Vec<Effect> {
        match timer {
            Timer::HealthTick => vec![Effect::Probe, Effect::health_tick()],
            Timer::FactPoll => vec![Effect::PollFacts],
            Timer::FlashClear { id } => {
                if self.flash.as_ref().is_some_and(|flash| flash.id == id) {
                    self.flash = None;
                }
                Vec::new()
            }
        }
    }

    // === Control messages ===

    fn on_control(&mut self, control: Control) -> Vec<Effect> {
        match control {
            Control::SwitchMode(next) => {
                if next.is_overlay() {
                    // Overlay modes are entered through OpenOverlay so the
                    // overlay state always exists before the mode does.
                    return Vec::new();
                }
                self.mode.enter(next);
                Vec::new()
            }
            Control::OpenOverlay(request) => self.open_overlay(request),
            Control::SwitchModel(name) => {
                if self.models.iter().any(|model| model == &name) {
                    self.model = name.clone();
                    vec![self.flash(FlashLevel::Info, format!("Model set to {name}"))]
                } else {
                    vec![self.flash(FlashLevel::Error, format!("Unknown model: {name}"))]
                }
            }
            Control::SwitchTheme(name) => {
                if palette::is_theme_name(&name) {
                    self.theme_name = name.to_lowercase();
                    vec![Effect::PersistTheme(self.theme_name.clone())]
                } else {
                    vec![self.flash(FlashLevel::Error, format!("Unknown theme: {name}"))]
                }
            }
            Control::SwitchStudio(index) => self.router.switch(index),
            Control::ResumeConversation { id, title } => {
                let mut effects = self.router.switch(panels::LLM);
                self.router
                    .panel_mut(panels::LLM)
                    .set_conversation(id, title.clone());
                effects.push(self.flash(FlashLevel::Info, format!("Resumed \"{title}\"")));
                effects
            }
            Control::InjectSystemText(text) => {
                match &mut self.system_prompt {
                    Some(existing) => {
                        existing.push('\n');
                        existing.push_str(&text);
                    }
                    None => self.system_prompt = Some(text),
                }
                vec![self.flash(FlashLevel::Info, "System prompt extended")]
            }
            Control::SetExternalContext(text) => {
                self.external_context = Some(text);
                vec![self.flash(FlashLevel::Info, "External context replaced")]
            }
            Control::FormResult(outcome) => {
                tracing::info!(
                    "form submitted: {} with {} fields",
                    outcome.form,
                    outcome.values.len()
                );
                vec![self.flash(FlashLevel::Info, format!("Form \"{}\" submitted", outcome.form))]
            }
        }
    }

    // === Overlays ===

    fn open_overlay(&mut self, request: OverlayRequest) -> Vec<Effect> {
        if self.mode.current().is_overlay() {
            return vec![self.flash(FlashLevel::Warn, "An overlay is already open")];
        }
        match request {
            OverlayRequest::Browse => {
                self.overlay = Overlay::Browse(BrowseOverlay::default());
                self.mode.enter(Mode::Browse);
                vec![Effect::LoadConversations]
            }
            OverlayRequest::Pair => {
                self.overlay = Overlay::Pair(PairOverlay::default());
                self.mode.enter(Mode::Pair);
                vec![Effect::RequestPairing]
            }
            OverlayRequest::Edit { path } => {
                // Readiness needs the file contents; the mode changes only
                // once they arrive.
                vec![Effect::LoadFile { path }]
            }
            OverlayRequest::Form { form } => match FormOverlay::build(&form) {
                Some(overlay) => {
                    self.overlay = Overlay::Form(overlay);
                    self.mode.enter(Mode::Form);
                    Vec::new()
                }
                None => vec![self.flash(FlashLevel::Error, format!("Unknown form: {form}"))],
            },
        }
    }

    fn run_overlay_action(&mut self, action: OverlayAction) -> Vec<Effect> {
        match action {
            OverlayAction::None => Vec::new(),
            OverlayAction::Close => {
                self.close_overlay();
                Vec::new()
            }
            OverlayAction::Emit(effect) => vec![effect],
            OverlayAction::EmitAndClose(effect) => {
                self.close_overlay();
                vec![effect]
            }
        }
    }

    /// Leaving the overlay's mode and dropping its state are one step, so
    /// a closed overlay can never linger "ready".
    fn close_overlay(&mut self) {
        self.overlay = Overlay::None;
        self.mode.enter(Mode::Normal);
    }

    // === Flash ===

    fn flash(&mut self, level: FlashLevel, text: impl Into<String>) -> Effect {
        self.flash_with_ttl(level, text, FLASH_TTL)
    }

    fn flash_with_ttl(
        &mut self,
        level: FlashLevel,
        text: impl Into<String>,
        ttl: Duration,
    ) -> Effect {
        self.flash_seq += 1;
        let id = self.flash_seq;
        self.flash = Some(Flash {
            id,
            level,
            text: text.into(),
        });
        Effect::Schedule {
            delay: ttl,
            timer: Timer::FlashClear { id },
        }
    }

    // === Render accessors ===

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode.current()
    }

    #[must_use]
    pub fn mode_prompt(&self) -> char {
        self.mode.prompt()
    }

    #[must_use]
    pub fn command_line(&self) -> &str {
        &self.command
    }

    #[must_use]
    pub fn composer(&self) -> &str {
        &self.composer
    }

    #[must_use]
    pub fn current_flash(&self) -> Option<&Flash> {
        self.flash.as_ref()
    }

    #[must_use]
    pub fn daemon_health(&self) -> HealthStatus {
        self.health
    }

    #[must_use]
    pub fn ui_theme(&self) -> UiTheme {
        palette::ui_theme(&self.theme_name)
    }

    #[must_use]
    pub fn is_home_visible(&self) -> bool {
        self.home_visible
    }

    #[must_use]
    pub fn is_chat_in_flight(&self) -> bool {
        self.chat_in_flight
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn transport(&self) -> &str {
        &self.transport_label
    }

    #[must_use]
    pub fn router(&self) -> &PanelRouter {
        &self.router
    }

    #[must_use]
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }
}

fn longest_common_prefix(candidates: &[String]) -> Option<String> {
    let mut iter = candidates.iter();
    let mut prefix = iter.next()?.clone();
    for candidate in iter {
        prefix = prefix
            .chars()
            .zip(candidate.chars())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a)
            .collect();
        if prefix.is_empty() {
            break;
        }
    }
    Some(prefix)
}

// === Capability context ===

impl ShellOps for Shell {
    fn current_model(&self) -> String {
        self.model.clone()
    }

    fn model_names(&self) -> Vec<String> {
        self.models.clone()
    }

    fn theme(&self) -> String {
        self.theme_name.clone()
    }

    fn studio_names(&self) -> Vec<String> {
        self.router.names().into_iter().map(String::from).collect()
    }

    fn active_studio(&self) -> usize {
        self.router.active()
    }

    fn system_prompt(&self) -> Option<String> {
        self.system_prompt.clone()
    }

    fn external_context(&self) -> Option<String> {
        self.external_context.clone()
    }

    fn health(&self) -> HealthStatus {
        self.health
    }

    fn transport_label(&self) -> String {
        self.transport_label.clone()
    }

    fn clear_transcript(&mut self) {
        self.router.panel_mut(panels::LLM).clear();
    }

    fn push_note(&mut self, text: &str) {
        self.router.panel_mut(panels::LLM).note(text);
    }
}
