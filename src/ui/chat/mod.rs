//! Chat UI components: transcript, composer, slash commands, and the
//! manager that wires them together

pub mod commands;
pub mod composer;
pub mod history;
pub mod manager;

pub use manager::{ChatAction, ChatManager};
