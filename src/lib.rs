//! Terminal chat client for a local LLM inference server.
//!
//! The [`controller::ChatController`] owns the transcript and issues requests to
//! three endpoints (chat, URL ingestion, file upload); the [`ui`] module draws it
//! with ratatui and [`app`] runs the terminal loop.

pub mod api;
pub mod app;
pub mod config;
pub mod controller;
pub mod events;
pub mod logging;
pub mod ui;

pub use api::{ApiError, ChatApi};
pub use config::Config;
pub use controller::{ChatController, Dispatch};
pub use events::{Message, Outcome, Sender};
