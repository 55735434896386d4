//! The council TUI — ratatui presentation layer.
//!
//! Sidebar of conversations grouped by day, a chat pane that renders each
//! assistant message as its stage blocks, and an input form. The TUI never
//! mutates conversation state: key presses become intents on the bus and
//! the controller's next snapshot is what gets drawn.
//!
//! ## Architecture (TEA)
//!
//! Model (`TuiApp`) + Update (message handler) + View (render).
//! Immediate mode, no retained widget state. Snapshots are owned copies,
//! no controller references held across frames.

pub mod app;
pub mod event;
pub mod input;
pub mod input_line;
pub mod layout;
pub mod markdown;
pub mod runner;
pub mod stages;
pub mod suggestions;
