//! LLM studio: the conversation transcript and its streaming tail.

use crossterm::event::KeyCode;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use crate::client::ChatEvent;
use crate::core::effect::Effect;
use crate::core::msg::Msg;
use crate::palette::{self, UiTheme};
use crate::tui::panels::Panel;

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    User(String),
    Assistant(String),
    Note(String),
    Tool { name: String, summary: String },
}

/// The chat transcript. Chat progress is addressed here by the shell no
/// matter which studio is focused, so a response keeps accumulating while
/// the user looks elsewhere.
#[derive(Debug, Default)]
pub struct LlmStudio {
    entries: Vec<Entry>,
    streaming: Option<String>,
    conversation: Option<String>,
    scroll_back: usize,
}

impl LlmStudio {
    fn flush_streaming(&mut self) {
        if let Some(text) = self.streaming.take() {
            if !text.is_empty() {
                self.entries.push(Entry::Assistant(text));
            }
        }
    }

    fn lines(&self) -> Vec<Line<'_>> {
        let mut lines: Vec<Line> = Vec::new();
        for entry in &self.entries {
            match entry {
                Entry::User(text) => {
                    push_block(&mut lines, "you ›", text, Style::default().bold());
                }
                Entry::Assistant(text) => {
                    push_block(
                        &mut lines,
                        "hecate ›",
                        text,
                        Style::default().fg(palette::TEXT_PRIMARY),
                    );
                }
                Entry::Note(text) => {
                    lines.push(Line::styled(
                        format!("· {text}"),
                        Style::default().fg(palette::TEXT_DIM).italic(),
                    ));
                }
                Entry::Tool { name, summary } => {
                    lines.push(Line::from(vec![
                        Span::styled(
                            format!("⚙ {name} "),
                            Style::default().fg(palette::MODE_COMMAND),
                        ),
                        Span::styled(summary.clone(), Style::default().fg(palette::TEXT_MUTED)),
                    ]));
                }
            }
            lines.push(Line::from(""));
        }
        if let Some(tail) = &self.streaming {
            push_block(
                &mut lines,
                "hecate ›",
                tail,
                Style::default().fg(palette::TEXT_PRIMARY),
            );
            lines.push(Line::styled("▌", Style::default().fg(palette::TEXT_DIM)));
        }
        lines
    }
}

fn push_block(lines: &mut Vec<Line<'_>>, who: &'static str, text: &str, style: Style) {
    lines.push(Line::styled(who, Style::default().fg(palette::TEXT_MUTED)));
    for part in text.split('\n') {
        lines.push(Line::styled(part.to_string(), style));
    }
}

fn tool_summary(input: &serde_json::Value) -> String {
    let rendered = input.to_string();
    if rendered.chars().count() > 60 {
        let clipped: String = rendered.chars().take(59).collect();
        format!("{clipped}…")
    } else {
        rendered
    }
}

impl Panel for LlmStudio {
    fn name(&self) -> &'static str {
        "LLM"
    }

    fn receive(&mut self, msg: &Msg) -> Vec<Effect> {
        if let Msg::Key(key) = msg {
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => {
                    self.scroll_back = self.scroll_back.saturating_sub(1);
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.scroll_back = (self.scroll_back + 1).min(self.lines().len());
                }
                KeyCode::Char('G') | KeyCode::End => self.scroll_back = 0,
                _ => {}
            }
        }
        Vec::new()
    }

    fn status(&self) -> String {
        let turns = self
            .entries
            .iter()
            .filter(|entry| matches!(entry, Entry::User(_)))
            .count();
        if self.streaming.is_some() {
            format!("{turns} turns · streaming")
        } else {
            format!("{turns} turns")
        }
    }

    fn render(&self, area: Rect, buf: &mut Buffer, _theme: &UiTheme) {
        let lines = self.lines();
        let height = area.height as usize;
        let bottom = lines.len().saturating_sub(self.scroll_back);
        let top = bottom.saturating_sub(height);
        let window: Vec<Line> = lines[top..bottom].to_vec();
        Paragraph::new(window).render(area, buf);
    }

    fn absorb_chat(&mut self, event: &ChatEvent) {
        match event {
            ChatEvent::Delta { text } => {
                self.streaming.get_or_insert_with(String::new).push_str(text);
            }
            ChatEvent::ToolCall { name, input } => {
                self.flush_streaming();
                self.entries.push(Entry::Tool {
                    name: name.clone(),
                    summary: tool_summary(input),
                });
            }
            ChatEvent::Done => self.flush_streaming(),
            ChatEvent::Failed { message } => {
                self.flush_streaming();
                self.entries
                    .push(Entry::Note(format!("response failed: {message}")));
            }
        }
    }

    fn note(&mut self, text: &str) {
        self.entries.push(Entry::Note(text.to_string()));
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.streaming = None;
        self.conversation = None;
        self.scroll_back = 0;
    }

    fn push_prompt(&mut self, text: &str) {
        self.entries.push(Entry::User(text.to_string()));
        self.scroll_back = 0;
    }

    fn set_conversation(&mut self, id: String, title: String) {
        self.entries.clear();
        self.streaming = None;
        self.scroll_back = 0;
        self.conversation = Some(id);
        self.entries
            .push(Entry::Note(format!("resumed \"{title}\"")));
    }

    fn conversation(&self) -> Option<String> {
        self.conversation.clone()
    }
}
