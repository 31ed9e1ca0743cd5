//! Node studio: peer and chain state from `node.*` facts.

use std::collections::VecDeque;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Style, Stylize};
use ratatui::text::Line;

use crate::core::effect::Effect;
use crate::core::msg::Msg;
use crate::facts::Fact;
use crate::palette::{self, UiTheme};
use crate::tui::panels::{render_tail, Panel};

const EVENT_CAP: usize = 200;

#[derive(Debug, Default)]
pub struct NodeStudio {
    peers: Option<u64>,
    height: Option<u64>,
    events: VecDeque<String>,
}

impl NodeStudio {
    fn push_event(&mut self, text: String) {
        if self.events.len() == EVENT_CAP {
            self.events.pop_front();
        }
        self.events.push_back(text);
    }

    fn absorb_fact(&mut self, fact: &Fact) {
        match fact.fact_type.as_str() {
            "node.peers" => {
                self.peers = fact.data.get("count").and_then(serde_json::Value::as_u64);
            }
            "node.block" => {
                self.height = fact.data.get("height").and_then(serde_json::Value::as_u64);
                if let Some(height) = self.height {
                    self.push_event(format!("block {height}"));
                }
            }
            other => self.push_event(format!("{other} {}", fact.data)),
        }
    }
}

impl Panel for NodeStudio {
    fn name(&self) -> &'static str {
        "Node"
    }

    fn receive(&mut self, msg: &Msg) -> Vec<Effect> {
        if let Msg::FactReceived(fact) = msg {
            self.absorb_fact(fact);
        }
        Vec::new()
    }

    fn status(&self) -> String {
        let peers = self.peers.map_or("?".to_string(), |n| n.to_string());
        let height = self.height.map_or("?".to_string(), |n| n.to_string());
        format!("peers {peers} · height {height}")
    }

    fn render(&self, area: Rect, buf: &mut Buffer, theme: &UiTheme) {
        let mut lines = vec![
            Line::styled(self.status(), Style::default().fg(theme.accent).bold()),
            Line::from(""),
        ];
        lines.extend(self.events.iter().map(|event| {
            Line::styled(event.clone(), Style::default().fg(palette::TEXT_PRIMARY))
        }));
        render_tail(lines, area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn gauges_update_from_their_facts() {
        let mut studio = NodeStudio::default();
        studio.receive(&Msg::FactReceived(Fact {
            fact_type: "node.peers".to_string(),
            data: json!({"count": 7}),
        }));
        studio.receive(&Msg::FactReceived(Fact {
            fact_type: "node.block".to_string(),
            data: json!({"height": 120_031}),
        }));
        assert_eq!(studio.status(), "peers 7 · height 120031");
        assert_eq!(studio.events.len(), 1);
    }

    #[test]
    fn unknown_node_facts_still_land_in_the_list() {
        let mut studio = NodeStudio::default();
        studio.receive(&Msg::FactReceived(Fact {
            fact_type: "node.reorg".to_string(),
            data: json!({"depth": 2}),
        }));
        assert_eq!(studio.events[0], "node.reorg {\"depth\":2}");
        assert_eq!(studio.status(), "peers ? · height ?");
    }
}
