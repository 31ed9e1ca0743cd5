//! Arcade studio: a leaderboard built from `arcade.*` facts.

use std::collections::BTreeMap;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Style, Stylize};
use ratatui::text::Line;

use crate::core::effect::Effect;
use crate::core::msg::Msg;
use crate::facts::Fact;
use crate::palette::{self, UiTheme};
use crate::tui::panels::{render_tail, Panel};

#[derive(Debug, Default)]
pub struct ArcadeStudio {
    // player -> best score
    scores: BTreeMap<String, i64>,
    last_event: Option<String>,
}

impl ArcadeStudio {
    fn absorb_fact(&mut self, fact: &Fact) {
        if fact.fact_type == "arcade.score" {
            let player = fact
                .data
                .get("player")
                .and_then(|value| value.as_str())
                .unwrap_or("anon")
                .to_string();
            let score = fact
                .data
                .get("score")
                .and_then(serde_json::Value::as_i64)
                .unwrap_or(0);
            let best = self.scores.entry(player).or_insert(score);
            *best = (*best).max(score);
        } else {
            self.last_event = Some(format!("{} {}", fact.fact_type, fact.data));
        }
    }

    fn ranked(&self) -> Vec<(&str, i64)> {
        let mut rows: Vec<(&str, i64)> = self
            .scores
            .iter()
            .map(|(player, score)| (player.as_str(), *score))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }
}

impl Panel for ArcadeStudio {
    fn name(&self) -> &'static str {
        "Arcade"
    }

    fn receive(&mut self, msg: &Msg) -> Vec<Effect> {
        if let Msg::FactReceived(fact) = msg {
            self.absorb_fact(fact);
        }
        Vec::new()
    }

    fn status(&self) -> String {
        match self.ranked().first() {
            Some((player, score)) => format!("top {player} {score}"),
            None => "no scores yet".to_string(),
        }
    }

    fn render(&self, area: Rect, buf: &mut Buffer, theme: &UiTheme) {
        let mut lines = vec![Line::styled(
            "Leaderboard",
            Style::default().fg(theme.accent).bold(),
        )];
        for (rank, (player, score)) in self.ranked().into_iter().enumerate() {
            lines.push(Line::styled(
                format!("{:>2}. {player:<20} {score}", rank + 1),
                Style::default().fg(palette::TEXT_PRIMARY),
            ));
        }
        if let Some(event) = &self.last_event {
            lines.push(Line::from(""));
            lines.push(Line::styled(
                event.clone(),
                Style::default().fg(palette::TEXT_DIM),
            ));
        }
        render_tail(lines, area, buf);
    }
}
