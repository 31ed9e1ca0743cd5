//! Effects returned by `update`.
//!
//! An effect is a description of future work, never the work itself. The
//! driver interprets each one off the loop and feeds any outcome back in as
//! a message, so `update` stays free of suspension points.

use std::path::PathBuf;
use std::time::Duration;

use crate::client::ChatRequest;
use crate::core::msg::{Msg, Timer};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Leave the loop and restore the terminal. Only an explicit user quit
    /// produces this.
    Quit,
    /// Issue one liveness probe; resolves to [`Msg::ProbeResult`].
    Probe,
    /// Arrange for the timer's message after the delay.
    Schedule { delay: Duration, timer: Timer },
    /// Open the fact subscription. Issued once at startup.
    SubscribeFacts,
    /// Drain one slot from the fact queue without waiting.
    PollFacts,
    /// Start streaming a chat response; progress arrives as [`Msg::Chat`].
    SendChat(ChatRequest),
    /// Tear down the in-flight chat response, if any.
    CancelChat,
    /// Fetch the conversation index; resolves to
    /// [`Msg::ConversationsLoaded`].
    LoadConversations,
    /// Request a pairing ticket; resolves to [`Msg::PairingReady`].
    RequestPairing,
    /// Read a file for the editor; resolves to [`Msg::FileLoaded`]. A
    /// missing file loads as an empty buffer.
    LoadFile { path: PathBuf },
    /// Write the editor buffer out; resolves to [`Msg::FileSaved`].
    SaveFile { path: PathBuf, contents: String },
    /// Persist the active studio index to settings.
    PersistActivePanel(usize),
    /// Persist the theme choice to settings.
    PersistTheme(String),
    /// Feed a message back into the mailbox for the next iteration.
    Emit(Msg),
}

impl Effect {
    /// Recurring health cadence, re-armed by each tick.
    #[must_use]
    pub fn health_tick() -> Self {
        Effect::Schedule {
            delay: Duration::from_secs(30),
            timer: Timer::HealthTick,
        }
    }

    /// Re-poll delay after an empty fact queue.
    #[must_use]
    pub fn fact_poll_delay() -> Self {
        Effect::Schedule {
            delay: crate::facts::POLL_INTERVAL,
            timer: Timer::FactPoll,
        }
    }
}
