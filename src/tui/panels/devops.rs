//! DevOps studio: deploys and alerts from the `ops.*` fact feed.

use std::collections::VecDeque;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;

use crate::core::effect::Effect;
use crate::core::msg::Msg;
use crate::facts::Fact;
use crate::palette::{self, UiTheme};
use crate::tui::panels::{render_tail, Panel};

const EVENT_CAP: usize = 200;

#[derive(Debug, Clone, PartialEq)]
struct OpsEvent {
    severe: bool,
    text: String,
}

#[derive(Debug, Default)]
pub struct DevOpsStudio {
    events: VecDeque<OpsEvent>,
    open_alerts: usize,
}

impl DevOpsStudio {
    fn push_event(&mut self, severe: bool, text: String) {
        if self.events.len() == EVENT_CAP {
            self.events.pop_front();
        }
        self.events.push_back(OpsEvent { severe, text });
    }

    fn absorb_fact(&mut self, fact: &Fact) {
        let data = &fact.data;
        match fact.fact_type.as_str() {
            "ops.deploy" => {
                let service = str_field(data, "service").unwrap_or("unknown");
                let version = str_field(data, "version").unwrap_or("?");
                let status = str_field(data, "status").unwrap_or("started");
                self.push_event(false, format!("deploy {service} {version} {status}"));
            }
            "ops.alert" => {
                self.open_alerts += 1;
                let severity = str_field(data, "severity").unwrap_or("warning");
                let summary = str_field(data, "summary").unwrap_or("(no summary)");
                self.push_event(true, format!("[{severity}] {summary}"));
            }
            "ops.alert_resolved" => {
                self.open_alerts = self.open_alerts.saturating_sub(1);
                let summary = str_field(data, "summary").unwrap_or("alert");
                self.push_event(false, format!("resolved: {summary}"));
            }
            other => {
                self.push_event(false, format!("{other} {data}"));
            }
        }
    }
}

fn str_field<'a>(data: &'a serde_json::Value, field: &str) -> Option<&'a str> {
    data.get(field).and_then(|value| value.as_str())
}

impl Panel for DevOpsStudio {
    fn name(&self) -> &'static str {
        "DevOps"
    }

    fn receive(&mut self, msg: &Msg) -> Vec<Effect> {
        if let Msg::FactReceived(fact) = msg {
            self.absorb_fact(fact);
        }
        Vec::new()
    }

    fn status(&self) -> String {
        format!("{} events · {} alerts", self.events.len(), self.open_alerts)
    }

    fn render(&self, area: Rect, buf: &mut Buffer, _theme: &UiTheme) {
        let lines: Vec<Line> = self
            .events
            .iter()
            .map(|event| {
                let style = if event.severe {
                    Style::default().fg(palette::STATUS_ERROR)
                } else {
                    Style::default().fg(palette::TEXT_PRIMARY)
                };
                Line::styled(event.text.clone(), style)
            })
            .collect();
        render_tail(lines, area, buf);
    }
}
