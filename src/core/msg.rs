//! Messages consumed by the shell.
//!
//! Every asynchronous source funnels through this one tagged union: the
//! terminal, timers, the health probe, the chat response stream, the fact
//! feed, and the commands and overlays themselves. The shell processes
//! exactly one message per loop iteration and is the only state mutator,
//! so none of this needs locking.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::client::{ChatEvent, Conversation, HealthStatus, PairingTicket};
use crate::facts::Fact;
use crate::tui::mode::Mode;

// === Timers ===

/// Scheduled deadlines. Delivery is "no earlier than" the delay, never exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// 30-second liveness cadence.
    HealthTick,
    /// 100ms re-poll delay after an empty fact queue. Fires as
    /// [`Msg::FactStreamContinue`].
    FactPoll,
    /// A flash notification reached its TTL. The id keeps a stale timer
    /// from clearing a newer flash.
    FlashClear { id: u64 },
}

// === Control messages ===

/// Prerequisites for entering an overlay mode.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayRequest {
    Browse,
    Pair,
    Edit { path: PathBuf },
    Form { form: String },
}

/// Answers submitted by a form overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct FormOutcome {
    pub form: String,
    pub values: Vec<(String, String)>,
}

/// Messages produced by command handlers and overlays rather than by I/O.
/// They round-trip through the mailbox so every state change still happens
/// inside one `update` call.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    /// Return to the named base mode.
    SwitchMode(Mode),
    /// Enter an overlay mode, carrying its prerequisites.
    OpenOverlay(OverlayRequest),
    /// Change the chat model.
    SwitchModel(String),
    /// Change the color theme.
    SwitchTheme(String),
    /// Activate the studio at the given index.
    SwitchStudio(usize),
    /// Continue a stored conversation in the LLM studio.
    ResumeConversation { id: String, title: String },
    /// Append operator text to the system prompt.
    InjectSystemText(String),
    /// Replace the external context block sent with chat requests.
    SetExternalContext(String),
    /// A form overlay submitted its answers.
    FormResult(FormOutcome),
}

// === Messages ===

/// One event for the shell to absorb.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Terminal geometry changed.
    Resize { width: u16, height: u16 },
    /// A key press, still unclassified.
    Key(KeyEvent),
    /// A scheduled deadline fired.
    Timer(Timer),
    /// The liveness probe resolved.
    ProbeResult(HealthStatus),
    /// Next fact dequeued from the subscription.
    FactReceived(Fact),
    /// The empty-queue delay elapsed; poll the fact queue again.
    FactStreamContinue,
    /// The fact producer is gone. Normal at shutdown only.
    FactStreamDisconnected,
    /// Progress on the in-flight chat response.
    Chat(ChatEvent),
    /// Conversation index fetched for the browse overlay.
    ConversationsLoaded(Result<Vec<Conversation>, String>),
    /// Pairing ticket fetched for the pair overlay.
    PairingReady(Result<PairingTicket, String>),
    /// File contents fetched for the edit overlay.
    FileLoaded {
        path: PathBuf,
        result: Result<String, String>,
    },
    /// The editor buffer finished writing to disk.
    FileSaved {
        path: PathBuf,
        result: Result<(), String>,
    },
    /// A command- or overlay-produced control message.
    Control(Control),
}

impl Msg {
    /// Bare key press without modifiers.
    #[must_use]
    pub fn key(code: KeyCode) -> Self {
        Msg::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    /// Key press with a modifier held.
    #[must_use]
    pub fn key_with(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Msg::Key(KeyEvent::new(code, modifiers))
    }
}
