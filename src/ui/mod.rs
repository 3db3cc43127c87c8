//! Terminal UI

pub mod conversation;
