//! Capability context for command handlers.
//!
//! Handlers never see the shell itself. They get this trait, which exposes
//! only the reads and writes a command is allowed to perform, so each
//! handler tests against a bench double instead of a fully wired shell.

use crate::client::HealthStatus;

pub trait ShellOps {
    /// Chat model currently in effect.
    fn current_model(&self) -> String;
    /// Models the daemon serves, for validation and completion.
    fn model_names(&self) -> Vec<String>;
    /// Active theme name.
    fn theme(&self) -> String;
    /// Studio names in display order.
    fn studio_names(&self) -> Vec<String>;
    /// Index of the active studio.
    fn active_studio(&self) -> usize;
    /// Current system prompt, if any.
    fn system_prompt(&self) -> Option<String>;
    /// External context block sent with chat requests, if any.
    fn external_context(&self) -> Option<String>;
    /// Last known daemon health.
    fn health(&self) -> HealthStatus;
    /// Human-readable description of the resolved transport.
    fn transport_label(&self) -> String;
    /// Drop the chat transcript.
    fn clear_transcript(&mut self);
    /// Append a notice line to the chat transcript.
    fn push_note(&mut self, text: &str);
}
