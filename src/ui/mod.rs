//! Terminal UI components

pub mod chat;
