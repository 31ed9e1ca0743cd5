//! Social studio: mention feed from `social.*` facts. Unread count resets
//! when the studio gains focus.

use std::collections::VecDeque;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Span};

use crate::core::effect::Effect;
use crate::core::msg::Msg;
use crate::facts::Fact;
use crate::palette::{self, UiTheme};
use crate::tui::panels::{render_tail, Panel};

const FEED_CAP: usize = 200;

#[derive(Debug, Clone, PartialEq)]
struct Post {
    author: String,
    text: String,
}

#[derive(Debug, Default)]
pub struct SocialStudio {
    feed: VecDeque<Post>,
    unread: usize,
    focused: bool,
}

impl SocialStudio {
    fn absorb_fact(&mut self, fact: &Fact) {
        let author = fact
            .data
            .get("author")
            .or_else(|| fact.data.get("from"))
            .and_then(|value| value.as_str())
            .unwrap_or("someone")
            .to_string();
        let text = fact
            .data
            .get("text")
            .or_else(|| fact.data.get("body"))
            .and_then(|value| value.as_str())
            .unwrap_or_default()
            .to_string();
        if self.feed.len() == FEED_CAP {
            self.feed.pop_front();
        }
        self.feed.push_back(Post { author, text });
        if !self.focused {
            self.unread += 1;
        }
    }
}

impl Panel for SocialStudio {
    fn name(&self) -> &'static str {
        "Social"
    }

    fn receive(&mut self, msg: &Msg) -> Vec<Effect> {
        if let Msg::FactReceived(fact) = msg {
            self.absorb_fact(fact);
        }
        Vec::new()
    }

    fn status(&self) -> String {
        format!("{} unread", self.unread)
    }

    fn focus(&mut self) {
        self.focused = true;
        self.unread = 0;
    }

    fn blur(&mut self) {
        self.focused = false;
    }

    fn render(&self, area: Rect, buf: &mut Buffer, theme: &UiTheme) {
        let lines: Vec<Line> = self
            .feed
            .iter()
            .map(|post| {
                Line::from(vec![
                    Span::styled(
                        format!("@{} ", post.author),
                        Style::default().fg(theme.accent).bold(),
                    ),
                    Span::styled(post.text.clone(), Style::default().fg(palette::TEXT_PRIMARY)),
                ])
            })
            .collect();
        render_tail(lines, area, buf);
    }
}
