//! Conversation UI components for the chat interface

pub mod commands;
pub mod composer;
pub mod history;
pub mod manager;
pub mod pending;

pub use commands::{SlashCommand, ParsedCommand, get_help_text};
pub use composer::{Composer, ComposerResult};
pub use history::TranscriptView;
pub use manager::{ConversationAction, ConversationManager, Focus};
pub use pending::PendingIndicator;
