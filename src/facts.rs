//! Live fact feed from the daemon.
//!
//! A background task holds the `/facts/stream` subscription open and pushes
//! parsed facts into a bounded queue. The UI loop drains that queue one fact
//! per iteration with a non-blocking poll, so a chatty daemon cannot starve
//! key handling. When the queue is full the producer waits instead of
//! dropping, which stalls the subscription until the UI catches up.

use std::ops::ControlFlow;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::{BodyLines, DaemonClient};

/// Queue depth before the producer blocks.
pub const QUEUE_CAPACITY: usize = 50;

/// Fixed delay between reconnect attempts. No backoff: the daemon is local
/// and a steady cadence keeps reattachment prompt.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// How long the UI loop waits before re-polling an empty queue.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Synthetic fact type for payloads that failed to parse. Routed to an
/// inline notice instead of a panel.
pub const MALFORMED_FACT_TYPE: &str = "stream.malformed";

// === Fact envelope ===

/// One event from the daemon's fact feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Fact {
    pub fact_type: String,
    #[serde(default)]
    pub data: Value,
}

impl Fact {
    /// Stand-in fact for a payload the daemon sent but we could not parse.
    /// The feed keeps flowing; only this entry is affected.
    fn malformed(error: &serde_json::Error, raw: &str) -> Self {
        Self {
            fact_type: MALFORMED_FACT_TYPE.to_string(),
            data: json!({
                "error": error.to_string(),
                "raw": clip(raw, 120),
            }),
        }
    }

    #[must_use]
    pub fn is_malformed(&self) -> bool {
        self.fact_type == MALFORMED_FACT_TYPE
    }
}

fn clip(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

// === Subscription ===

/// Result of one non-blocking queue poll.
#[derive(Debug, Clone, PartialEq)]
pub enum FactPoll {
    /// A fact was waiting.
    Fact(Fact),
    /// Nothing queued; re-poll after `POLL_INTERVAL`.
    Empty,
    /// The producer task is gone.
    Disconnected,
}

/// Consumer half of the fact feed, owned by the UI loop.
pub struct FactSubscription {
    receiver: mpsc::Receiver<Fact>,
    task: JoinHandle<()>,
}

impl FactSubscription {
    /// Non-blocking drain step. Never waits; an empty queue is a normal
    /// answer, not an error.
    pub fn poll(&mut self) -> FactPoll {
        match self.receiver.try_recv() {
            Ok(fact) => FactPoll::Fact(fact),
            Err(mpsc::error::TryRecvError::Empty) => FactPoll::Empty,
            Err(mpsc::error::TryRecvError::Disconnected) => FactPoll::Disconnected,
        }
    }

    pub async fn shutdown(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}

/// Start the subscription task. It reconnects on a fixed cadence until the
/// token is cancelled.
pub fn subscribe(client: DaemonClient, cancel: CancellationToken) -> FactSubscription {
    let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
    let task = tokio::spawn(run(client, sender, cancel));
    FactSubscription { receiver, task }
}

async fn run(client: DaemonClient, sender: mpsc::Sender<Fact>, cancel: CancellationToken) {
    loop {
        if cancel.is_cancelled() {
            return;
        }
        match client.open_fact_stream().await {
            Ok(mut lines) => {
                tracing::info!("fact stream connected");
                if pump(&mut lines, &sender, &cancel).await.is_break() {
                    return;
                }
            }
            Err(err) => {
                tracing::warn!("fact stream connect failed: {}", err);
            }
        }
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
        }
    }
}

/// Read one connection to its end. `Break` means stop for good, `Continue`
/// means reconnect after the delay.
async fn pump(
    lines: &mut BodyLines,
    sender: &mpsc::Sender<Fact>,
    cancel: &CancellationToken,
) -> ControlFlow<()> {
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return ControlFlow::Break(()),
            next = lines.next_line() => next,
        };
        match next {
            Ok(Some(line)) => {
                let Some(fact) = parse_fact_line(&line) else {
                    continue;
                };
                // A full queue blocks here; cancellation must still win so
                // shutdown cannot deadlock behind backpressure.
                tokio::select! {
                    _ = cancel.cancelled() => return ControlFlow::Break(()),
                    sent = sender.send(fact) => {
                        if sent.is_err() {
                            return ControlFlow::Break(());
                        }
                    }
                }
            }
            Ok(None) => {
                tracing::info!("fact stream closed by daemon");
                return ControlFlow::Continue(());
            }
            Err(err) => {
                tracing::warn!("fact stream read failed: {}", err);
                return ControlFlow::Continue(());
            }
        }
    }
}

/// Decode one wire line. Heartbeats (blank or comment lines), non-data
/// fields, and the `[DONE]` sentinel all yield nothing; malformed payloads
/// yield a notice fact so the user sees the drop.
fn parse_fact_line(line: &str) -> Option<Fact> {
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    let data = line.strip_prefix("data:")?.trim_start();
    if data == "[DONE]" {
        return None;
    }
    match serde_json::from_str(data) {
        Ok(fact) => Some(fact),
        Err(err) => {
            tracing::warn!("dropping malformed fact: {}", err);
            Some(Fact::malformed(&err, data))
        }
    }
}
