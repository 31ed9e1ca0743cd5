//! Terminal UI module for hecate.

// === Submodules ===

pub mod mode;
pub mod overlay;
pub mod panels;
pub mod shell;
pub mod ui;

// === Re-exports ===

pub use ui::run_tui;
