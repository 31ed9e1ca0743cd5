//! Modal overlays: Browse, Pair, Edit, Form.
//!
//! At most one overlay exists at a time, and which one is encoded in a
//! single tagged value so two overlays can never be "ready" together. The
//! shell keeps the active variant in lock step with the mode: entering an
//! overlay mode constructs the state here, leaving the mode drops it.
//!
//! Overlays get first refusal on every key. Returning [`OverlayAction::Close`]
//! is how an overlay asks the shell to run the mode transition back to
//! Normal; it never mutates the mode itself.

use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Widget, Wrap};

use crate::client::{Conversation, PairingTicket};
use crate::core::effect::Effect;
use crate::core::msg::{Control, FormOutcome, Msg};
use crate::facts::Fact;
use crate::palette::{self, UiTheme};
use crate::tui::mode::Mode;

/// Forms the form overlay knows how to build.
pub const FORM_TYPES: &[&str] = &["feedback", "incident"];

// === Actions ===

/// What an overlay wants after handling a key.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayAction {
    /// Key handled, nothing further.
    None,
    /// Leave this overlay's mode.
    Close,
    /// Run an effect and stay up.
    Emit(Effect),
    /// Run an effect and leave this overlay's mode.
    EmitAndClose(Effect),
}

// === Overlay ===

/// The single active overlay, or none.
#[derive(Debug, Default)]
pub enum Overlay {
    #[default]
    None,
    Browse(BrowseOverlay),
    Pair(PairOverlay),
    Edit(EditOverlay),
    Form(FormOverlay),
}

impl Overlay {
    /// Mode this overlay belongs to.
    #[must_use]
    pub fn mode(&self) -> Option<Mode> {
        match self {
            Overlay::None => None,
            Overlay::Browse(_) => Some(Mode::Browse),
            Overlay::Pair(_) => Some(Mode::Pair),
            Overlay::Edit(_) => Some(Mode::Edit),
            Overlay::Form(_) => Some(Mode::Form),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> OverlayAction {
        match self {
            Overlay::None => OverlayAction::None,
            Overlay::Browse(browse) => browse.handle_key(key),
            Overlay::Pair(pair) => pair.handle_key(key),
            Overlay::Edit(edit) => edit.handle_key(key),
            Overlay::Form(form) => form.handle_key(key),
        }
    }

    /// Route a non-key message to the overlay it concerns. Returns false
    /// when the message found no matching overlay, so the caller can
    /// surface it some other way.
    pub fn absorb(&mut self, msg: &Msg) -> bool {
        match (self, msg) {
            (Overlay::Browse(browse), Msg::ConversationsLoaded(result)) => {
                browse.loaded(result.clone());
                true
            }
            (Overlay::Pair(pair), Msg::PairingReady(result)) => {
                pair.ticket_ready(result.clone());
                true
            }
            (Overlay::Pair(pair), Msg::FactReceived(fact)) => pair.absorb_fact(fact),
            (Overlay::Edit(edit), Msg::FileSaved { path, result }) => {
                edit.saved(path, result.clone());
                true
            }
            _ => false,
        }
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &UiTheme) {
        match self {
            Overlay::None => {}
            Overlay::Browse(browse) => browse.render(area, buf, theme),
            Overlay::Pair(pair) => pair.render(area, buf, theme),
            Overlay::Edit(edit) => edit.render(area, buf, theme),
            Overlay::Form(form) => form.render(area, buf, theme),
        }
    }
}

// === Browse ===

/// Conversation browser over the daemon's index.
#[derive(Debug, Default)]
pub struct BrowseOverlay {
    conversations: Option<Vec<Conversation>>,
    selected: usize,
    error: Option<String>,
}

impl BrowseOverlay {
    pub fn loaded(&mut self, result: Result<Vec<Conversation>, String>) {
        match result {
            Ok(conversations) => {
                self.selected = 0;
                self.conversations = Some(conversations);
                self.error = None;
            }
            Err(error) => self.error = Some(error),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> OverlayAction {
        let count = self.conversations.as_ref().map_or(0, Vec::len);
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => OverlayAction::Close,
            KeyCode::Down | KeyCode::Char('j') if count > 0 => {
                self.selected = (self.selected + 1).min(count - 1);
                OverlayAction::None
            }
            KeyCode::Up | KeyCode::Char('k') if count > 0 => {
                self.selected = self.selected.saturating_sub(1);
                OverlayAction::None
            }
            KeyCode::Enter => {
                let Some(conversation) = self
                    .conversations
                    .as_ref()
                    .and_then(|list| list.get(self.selected))
                else {
                    return OverlayAction::None;
                };
                OverlayAction::EmitAndClose(Effect::Emit(Msg::Control(
                    Control::ResumeConversation {
                        id: conversation.id.clone(),
                        title: conversation.title.clone(),
                    },
                )))
            }
            _ => OverlayAction::None,
        }
    }

    fn render(&self, area: Rect, buf: &mut Buffer, theme: &UiTheme) {
        let area = centered_rect(60, 70, area);
        Clear.render(area, buf);
        let block = modal_block("Conversations", theme);
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line> = Vec::new();
        match (&self.conversations, &self.error) {
            (_, Some(error)) => {
                lines.push(Line::styled(
                    format!("Could not load conversations: {error}"),
                    Style::default().fg(palette::STATUS_ERROR),
                ));
            }
            (None, None) => lines.push(Line::from("Loading…")),
            (Some(list), None) if list.is_empty() => {
                lines.push(Line::from("No stored conversations."));
            }
            (Some(list), None) => {
                for (index, conversation) in list.iter().enumerate() {
                    let stamp = conversation
                        .updated_at
                        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default();
                    let mut line = Line::from(vec![
                        Span::raw(format!("{:<40}", clip_to_width(&conversation.title, 40))),
                        Span::styled(stamp, Style::default().fg(palette::TEXT_DIM)),
                    ]);
                    if index == self.selected {
                        line = line.style(Style::default().bg(theme.selection_bg));
                    }
                    lines.push(line);
                }
            }
        }
        lines.push(Line::from(""));
        lines.push(hint_line("Enter resume · j/k move · Esc close"));
        Paragraph::new(lines).render(inner, buf);
    }
}

// === Pair ===

/// Pairing code display. The code comes from the daemon; completion shows
/// up as a pair fact on the feed.
#[derive(Debug, Default)]
pub struct PairOverlay {
    ticket: Option<PairingTicket>,
    error: Option<String>,
    paired: bool,
}

impl PairOverlay {
    pub fn ticket_ready(&mut self, result: Result<PairingTicket, String>) {
        match result {
            Ok(ticket) => {
                self.ticket = Some(ticket);
                self.error = None;
            }
            Err(error) => self.error = Some(error),
        }
    }

    /// Pair facts complete the handshake while this overlay is up.
    fn absorb_fact(&mut self, fact: &Fact) -> bool {
        if fact.fact_type != "pair" && !fact.fact_type.starts_with("pair.") {
            return false;
        }
        let status = fact.data.get("status").and_then(|v| v.as_str());
        if matches!(status, Some("paired" | "complete")) {
            self.paired = true;
        }
        true
    }

    fn handle_key(&mut self, key: KeyEvent) -> OverlayAction {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => OverlayAction::Close,
            KeyCode::Enter if self.paired => OverlayAction::Close,
            KeyCode::Char('r') => {
                self.ticket = None;
                self.error = None;
                OverlayAction::Emit(Effect::RequestPairing)
            }
            _ => OverlayAction::None,
        }
    }

    fn render(&self, area: Rect, buf: &mut Buffer, theme: &UiTheme) {
        let area = centered_rect(44, 40, area);
        Clear.render(area, buf);
        let block = modal_block("Pair device", theme);
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line> = Vec::new();
        if self.paired {
            lines.push(Line::styled(
                "Paired.",
                Style::default().fg(palette::STATUS_HEALTHY).bold(),
            ));
        } else if let Some(error) = &self.error {
            lines.push(Line::styled(
                format!("Pairing failed: {error}"),
                Style::default().fg(palette::STATUS_ERROR),
            ));
        } else if let Some(ticket) = &self.ticket {
            lines.push(Line::from("Enter this code on the other device:"));
            lines.push(Line::from(""));
            lines.push(Line::styled(
                format!("   {}", ticket.code),
                Style::default().fg(theme.accent).bold(),
            ));
            if let Some(secs) = ticket.expires_secs {
                lines.push(Line::styled(
                    format!("   expires in {secs}s"),
                    Style::default().fg(palette::TEXT_DIM),
                ));
            }
        } else {
            lines.push(Line::from("Requesting a pairing code…"));
        }
        lines.push(Line::from(""));
        lines.push(hint_line("r new code · Esc close"));
        Paragraph::new(lines).wrap(Wrap { trim: false }).render(inner, buf);
    }
}

// === Edit ===

/// Minimal line editor over one file. Esc on a dirty buffer asks once
/// before discarding; that first Esc never leaves the mode.
#[derive(Debug)]
pub struct EditOverlay {
    path: PathBuf,
    lines: Vec<String>,
    row: usize,
    col: usize,
    dirty: bool,
    confirm_discard: bool,
    saving: bool,
    error: Option<String>,
}

impl EditOverlay {
    pub fn new(path: PathBuf, contents: &str) -> Self {
        let mut lines: Vec<String> = contents.lines().map(ToString::to_string).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        Self {
            path,
            lines,
            row: 0,
            col: 0,
            dirty: false,
            confirm_discard: false,
            saving: false,
            error: None,
        }
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn confirming_discard(&self) -> bool {
        self.confirm_discard
    }

    pub fn saved(&mut self, path: &Path, result: Result<(), String>) {
        if path != self.path {
            return;
        }
        self.saving = false;
        match result {
            Ok(()) => {
                self.dirty = false;
                self.error = None;
            }
            Err(error) => self.error = Some(error),
        }
    }

    fn contents(&self) -> String {
        let mut joined = self.lines.join("\n");
        joined.push('\n');
        joined
    }

    fn current_line_chars(&self) -> usize {
        self.lines[self.row].chars().count()
    }

    fn byte_col(&self) -> usize {
        byte_index_at_char(&self.lines[self.row], self.col)
    }

    fn handle_key(&mut self, key: KeyEvent) -> OverlayAction {
        // Any key except Esc withdraws a pending discard question.
        if key.code != KeyCode::Esc {
            self.confirm_discard = false;
        }
        if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.saving = true;
            return OverlayAction::Emit(Effect::SaveFile {
                path: self.path.clone(),
                contents: self.contents(),
            });
        }
        match key.code {
            KeyCode::Esc => {
                if self.dirty && !self.confirm_discard {
                    self.confirm_discard = true;
                    OverlayAction::None
                } else {
                    OverlayAction::Close
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let at = self.byte_col();
                self.lines[self.row].insert(at, c);
                self.col += 1;
                self.dirty = true;
                OverlayAction::None
            }
            KeyCode::Tab => {
                let at = self.byte_col();
                self.lines[self.row].insert_str(at, "    ");
                self.col += 4;
                self.dirty = true;
                OverlayAction::None
            }
            KeyCode::Enter => {
                let at = self.byte_col();
                let rest = self.lines[self.row].split_off(at);
                self.lines.insert(self.row + 1, rest);
                self.row += 1;
                self.col = 0;
                self.dirty = true;
                OverlayAction::None
            }
            KeyCode::Backspace => {
                if self.col > 0 {
                    self.col -= 1;
                    let at = self.byte_col();
                    self.lines[self.row].remove(at);
                    self.dirty = true;
                } else if self.row > 0 {
                    let line = self.lines.remove(self.row);
                    self.row -= 1;
                    self.col = self.current_line_chars();
                    self.lines[self.row].push_str(&line);
                    self.dirty = true;
                }
                OverlayAction::None
            }
            KeyCode::Left => {
                if self.col > 0 {
                    self.col -= 1;
                } else if self.row > 0 {
                    self.row -= 1;
                    self.col = self.current_line_chars();
                }
                OverlayAction::None
            }
            KeyCode::Right => {
                if self.col < self.current_line_chars() {
                    self.col += 1;
                } else if self.row + 1 < self.lines.len() {
                    self.row += 1;
                    self.col = 0;
                }
                OverlayAction::None
            }
            KeyCode::Up => {
                if self.row > 0 {
                    self.row -= 1;
                    self.col = self.col.min(self.current_line_chars());
                }
                OverlayAction::None
            }
            KeyCode::Down => {
                if self.row + 1 < self.lines.len() {
                    self.row += 1;
                    self.col = self.col.min(self.current_line_chars());
                }
                OverlayAction::None
            }
            KeyCode::Home => {
                self.col = 0;
                OverlayAction::None
            }
            KeyCode::End => {
                self.col = self.current_line_chars();
                OverlayAction::None
            }
            _ => OverlayAction::None,
        }
    }

    fn render(&self, area: Rect, buf: &mut Buffer, theme: &UiTheme) {
        let area = centered_rect(80, 80, area);
        Clear.render(area, buf);
        let marker = if self.dirty { " +" } else { "" };
        let title = format!("Edit {}{marker}", self.path.display());
        let block = modal_block(&title, theme);
        let inner = block.inner(area);
        block.render(area, buf);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);

        let height = rows[0].height as usize;
        let top = self.row.saturating_sub(height.saturating_sub(1));
        let mut lines: Vec<Line> = Vec::new();
        for (offset, text) in self.lines.iter().skip(top).take(height.max(1)).enumerate() {
            let mut line = Line::from(text.as_str());
            if top + offset == self.row {
                line = line.style(Style::default().bg(theme.composer_bg));
            }
            lines.push(line);
        }
        Paragraph::new(lines).render(rows[0], buf);

        let footer = if self.confirm_discard {
            Line::styled(
                "Unsaved changes. Esc again to discard them.",
                Style::default().fg(palette::STATUS_ERROR).bold(),
            )
        } else if let Some(error) = &self.error {
            Line::styled(
                format!("Save failed: {error}"),
                Style::default().fg(palette::STATUS_ERROR),
            )
        } else if self.saving {
            Line::styled("Saving…", Style::default().fg(palette::TEXT_DIM))
        } else {
            hint_line("Ctrl+S save · Esc close")
        };
        Paragraph::new(footer).render(rows[1], buf);
    }
}

// === Form ===

/// One field of a form: a fixed option list or free text.
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Select {
        id: &'static str,
        label: &'static str,
        options: &'static [&'static str],
        selected: usize,
    },
    Text {
        id: &'static str,
        label: &'static str,
        value: String,
    },
}

/// Form overlay built from a named field layout.
#[derive(Debug)]
pub struct FormOverlay {
    form: String,
    fields: Vec<FormField>,
    active: usize,
}

impl FormOverlay {
    /// Build the named form. Unknown names yield `None`, which the shell
    /// treats as a failed prerequisite.
    pub fn build(form: &str) -> Option<Self> {
        let fields = match form {
            "feedback" => vec![
                FormField::Select {
                    id: "rating",
                    label: "How is hecate treating you?",
                    options: &["great", "good", "meh", "poor"],
                    selected: 0,
                },
                FormField::Text {
                    id: "comments",
                    label: "Anything else",
                    value: String::new(),
                },
            ],
            "incident" => vec![
                FormField::Select {
                    id: "severity",
                    label: "Severity",
                    options: &["low", "medium", "high", "critical"],
                    selected: 1,
                },
                FormField::Text {
                    id: "summary",
                    label: "What happened",
                    value: String::new(),
                },
            ],
            _ => return None,
        };
        Some(Self {
            form: form.to_string(),
            fields,
            active: 0,
        })
    }

    fn outcome(&self) -> FormOutcome {
        let values = self
            .fields
            .iter()
            .map(|field| match field {
                FormField::Select {
                    id,
                    options,
                    selected,
                    ..
                } => ((*id).to_string(), options[*selected].to_string()),
                FormField::Text { id, value, .. } => ((*id).to_string(), value.clone()),
            })
            .collect();
        FormOutcome {
            form: self.form.clone(),
            values,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> OverlayAction {
        match key.code {
            KeyCode::Esc => OverlayAction::Close,
            KeyCode::Enter => OverlayAction::EmitAndClose(Effect::Emit(Msg::Control(
                Control::FormResult(self.outcome()),
            ))),
            KeyCode::Down | KeyCode::Tab => {
                self.active = (self.active + 1) % self.fields.len();
                OverlayAction::None
            }
            KeyCode::Up => {
                self.active = self.active.checked_sub(1).unwrap_or(self.fields.len() - 1);
                OverlayAction::None
            }
            KeyCode::Left => {
                if let FormField::Select {
                    options, selected, ..
                } = &mut self.fields[self.active]
                {
                    *selected = selected.checked_sub(1).unwrap_or(options.len() - 1);
                }
                OverlayAction::None
            }
            KeyCode::Right => {
                if let FormField::Select {
                    options, selected, ..
                } = &mut self.fields[self.active]
                {
                    *selected = (*selected + 1) % options.len();
                }
                OverlayAction::None
            }
            KeyCode::Backspace => {
                if let FormField::Text { value, .. } = &mut self.fields[self.active] {
                    value.pop();
                }
                OverlayAction::None
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let FormField::Text { value, .. } = &mut self.fields[self.active] {
                    value.push(c);
                }
                OverlayAction::None
            }
            _ => OverlayAction::None,
        }
    }

    fn render(&self, area: Rect, buf: &mut Buffer, theme: &UiTheme) {
        let area = centered_rect(54, 50, area);
        Clear.render(area, buf);
        let block = modal_block(&format!("Form: {}", self.form), theme);
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line> = Vec::new();
        for (index, field) in self.fields.iter().enumerate() {
            let active = index == self.active;
            let pointer = if active { "> " } else { "  " };
            match field {
                FormField::Select {
                    label,
                    options,
                    selected,
                    ..
                } => {
                    let mut line = Line::from(vec![
                        Span::raw(pointer),
                        Span::raw(format!("{label}: ")),
                        Span::styled(
                            format!("< {} >", options[*selected]),
                            Style::default().fg(theme.accent),
                        ),
                    ]);
                    if active {
                        line = line.style(Style::default().bg(theme.selection_bg));
                    }
                    lines.push(line);
                }
                FormField::Text { label, value, .. } => {
                    let shown = if active {
                        format!("{value}_")
                    } else {
                        value.clone()
                    };
                    let mut line = Line::from(vec![
                        Span::raw(pointer),
                        Span::raw(format!("{label}: ")),
                        Span::raw(shown),
                    ]);
                    if active {
                        line = line.style(Style::default().bg(theme.selection_bg));
                    }
                    lines.push(line);
                }
            }
            lines.push(Line::from(""));
        }
        lines.push(hint_line("Enter submit · Tab next field · ←/→ pick · Esc cancel"));
        Paragraph::new(lines).wrap(Wrap { trim: false }).render(inner, buf);
    }
}

// === Shared rendering helpers ===

fn modal_block<'a>(title: &str, theme: &UiTheme) -> Block<'a> {
    Block::default()
        .title(Line::from(vec![Span::styled(
            title.to_string(),
            Style::default().fg(theme.accent).bold(),
        )]))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette::BORDER_COLOR))
        .style(Style::default().bg(palette::HECATE_NIGHT))
        .padding(Padding::uniform(1))
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1]);
    horizontal[1]
}

fn hint_line(text: &str) -> Line<'static> {
    Line::styled(text.to_string(), Style::default().fg(palette::TEXT_DIM))
}

fn clip_to_width(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let clipped: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{clipped}…")
    }
}

/// Byte offset of the `col`-th character, clamped to the line end.
fn byte_index_at_char(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map_or(line.len(), |(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn browse_enter_resumes_the_selected_conversation() {
        let mut browse = BrowseOverlay::default();
        browse.loaded(Ok(vec![
            Conversation {
                id: "c1".to_string(),
                title: "first".to_string(),
                updated_at: None,
            },
            Conversation {
                id: "c2".to_string(),
                title: "second".to_string(),
                updated_at: None,
            },
        ]));
        browse.handle_key(key(KeyCode::Char('j')));
        match browse.handle_key(key(KeyCode::Enter)) {
            OverlayAction::EmitAndClose(Effect::Emit(Msg::Control(
                Control::ResumeConversation { id, title },
            ))) => {
                assert_eq!(id, "c2");
                assert_eq!(title, "second");
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn browse_selection_clamps_at_both_ends() {
        let mut browse = BrowseOverlay::default();
        browse.loaded(Ok(vec![Conversation {
            id: "only".to_string(),
            title: "only".to_string(),
            updated_at: None,
        }]));
        browse.handle_key(key(KeyCode::Up));
        browse.handle_key(key(KeyCode::Char('j')));
        browse.handle_key(key(KeyCode::Char('j')));
        assert_eq!(browse.selected, 0);
    }

    #[test]
    fn browse_enter_with_nothing_loaded_stays_open() {
        let mut browse = BrowseOverlay::default();
        assert_eq!(browse.handle_key(key(KeyCode::Enter)), OverlayAction::None);
    }

    #[test]
    fn pair_marks_itself_on_a_pair_fact() {
        let mut pair = PairOverlay::default();
        assert!(!pair.absorb_fact(&Fact {
            fact_type: "ops.deploy".to_string(),
            data: json!({}),
        }));
        assert!(pair.absorb_fact(&Fact {
            fact_type: "pair".to_string(),
            data: json!({"status": "paired"}),
        }));
        assert!(pair.paired);
    }

    #[test]
    fn pair_r_requests_a_fresh_ticket() {
        let mut pair = PairOverlay::default();
        pair.ticket_ready(Ok(PairingTicket {
            code: "491-220".to_string(),
            expires_secs: Some(120),
        }));
        assert_eq!(
            pair.handle_key(key(KeyCode::Char('r'))),
            OverlayAction::Emit(Effect::RequestPairing)
        );
        assert!(pair.ticket.is_none());
    }

    #[test]
    fn edit_typing_marks_dirty_and_esc_asks_once() {
        let mut edit = EditOverlay::new(PathBuf::from("a.txt"), "hello\n");
        edit.handle_key(key(KeyCode::End));
        edit.handle_key(key(KeyCode::Char('!')));
        assert!(edit.is_dirty());

        // First Esc is consumed by the confirmation.
        assert_eq!(edit.handle_key(key(KeyCode::Esc)), OverlayAction::None);
        assert!(edit.confirming_discard());
        // Second Esc closes.
        assert_eq!(edit.handle_key(key(KeyCode::Esc)), OverlayAction::Close);
    }

    #[test]
    fn edit_any_other_key_withdraws_the_discard_question() {
        let mut edit = EditOverlay::new(PathBuf::from("a.txt"), "x");
        edit.handle_key(key(KeyCode::Char('y')));
        edit.handle_key(key(KeyCode::Esc));
        assert!(edit.confirming_discard());
        edit.handle_key(key(KeyCode::Left));
        assert!(!edit.confirming_discard());
    }

    #[test]
    fn edit_clean_buffer_closes_on_first_esc() {
        let mut edit = EditOverlay::new(PathBuf::from("a.txt"), "hello\n");
        assert_eq!(edit.handle_key(key(KeyCode::Esc)), OverlayAction::Close);
    }

    #[test]
    fn edit_save_emits_the_whole_buffer() {
        let mut edit = EditOverlay::new(PathBuf::from("notes.md"), "one");
        edit.handle_key(key(KeyCode::End));
        edit.handle_key(key(KeyCode::Enter));
        edit.handle_key(key(KeyCode::Char('t')));
        edit.handle_key(key(KeyCode::Char('w')));
        edit.handle_key(key(KeyCode::Char('o')));
        match edit.handle_key(ctrl('s')) {
            OverlayAction::Emit(Effect::SaveFile { path, contents }) => {
                assert_eq!(path, PathBuf::from("notes.md"));
                assert_eq!(contents, "one\ntwo\n");
            }
            other => panic!("unexpected action: {other:?}"),
        }
        // A successful save clears the dirty flag.
        edit.saved(Path::new("notes.md"), Ok(()));
        assert!(!edit.is_dirty());
        assert_eq!(edit.handle_key(key(KeyCode::Esc)), OverlayAction::Close);
    }

    #[test]
    fn edit_backspace_joins_lines_at_column_zero() {
        let mut edit = EditOverlay::new(PathBuf::from("a.txt"), "ab\ncd");
        edit.handle_key(key(KeyCode::Down));
        edit.handle_key(key(KeyCode::Backspace));
        assert_eq!(edit.lines, vec!["abcd".to_string()]);
        assert_eq!((edit.row, edit.col), (0, 2));
    }

    #[test]
    fn edit_cursor_is_char_based_not_byte_based() {
        let mut edit = EditOverlay::new(PathBuf::from("a.txt"), "héllo");
        edit.handle_key(key(KeyCode::Right));
        edit.handle_key(key(KeyCode::Right));
        edit.handle_key(key(KeyCode::Char('x')));
        assert_eq!(edit.lines[0], "héxllo");
    }

    #[test]
    fn form_submission_collects_every_field() {
        let mut form = FormOverlay::build("incident").expect("form");
        form.handle_key(key(KeyCode::Right));
        form.handle_key(key(KeyCode::Tab));
        for c in "db down".chars() {
            form.handle_key(key(KeyCode::Char(c)));
        }
        match form.handle_key(key(KeyCode::Enter)) {
            OverlayAction::EmitAndClose(Effect::Emit(Msg::Control(Control::FormResult(
                outcome,
            )))) => {
                assert_eq!(outcome.form, "incident");
                assert_eq!(
                    outcome.values,
                    vec![
                        ("severity".to_string(), "high".to_string()),
                        ("summary".to_string(), "db down".to_string()),
                    ]
                );
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn form_build_rejects_unknown_names() {
        assert!(FormOverlay::build("karaoke").is_none());
        for name in FORM_TYPES {
            assert!(FormOverlay::build(name).is_some(), "form {name}");
        }
    }

    #[test]
    fn overlay_reports_its_mode() {
        assert_eq!(Overlay::None.mode(), None);
        assert_eq!(
            Overlay::Browse(BrowseOverlay::default()).mode(),
            Some(Mode::Browse)
        );
        assert_eq!(
            Overlay::Edit(EditOverlay::new(PathBuf::from("x"), "")).mode(),
            Some(Mode::Edit)
        );
    }

    #[test]
    fn absorb_routes_only_matching_messages() {
        let mut overlay = Overlay::Pair(PairOverlay::default());
        assert!(overlay.absorb(&Msg::PairingReady(Ok(PairingTicket {
            code: "111-222".to_string(),
            expires_secs: None,
        }))));
        assert!(!overlay.absorb(&Msg::ConversationsLoaded(Ok(Vec::new()))));
        assert!(!Overlay::None.absorb(&Msg::ConversationsLoaded(Ok(Vec::new()))));
    }
}
