//! Chat view controller: transcript, drafts, pending flag and the three request flows.

use crate::api::ChatApi;
use crate::events::{Message, Outcome};
use std::path::PathBuf;
use tokio::sync::mpsc;

pub const CHAT_FAILED: &str = "Error fetching response.";
pub const URL_FAILED: &str = "Failed to fetch URL.";
pub const UPLOAD_FAILED: &str = "Failed to upload file.";

/// Whether a submit operation issued a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Sent,
    Ignored,
}

/// Owns the conversation state and reconciles request outcomes into it
pub struct ChatController {
    api: ChatApi,
    transcript: Vec<Message>,
    draft: String,
    url_draft: String,
    pending: bool,
    /// Lines scrolled back from the latest message
    scroll_back: usize,
    in_flight: usize,
    outcome_tx: mpsc::UnboundedSender<Outcome>,
    outcome_rx: mpsc::UnboundedReceiver<Outcome>,
}

impl ChatController {
    pub fn new(api: ChatApi) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        Self {
            api,
            transcript: Vec::new(),
            draft: String::new(),
            url_draft: String::new(),
            pending: false,
            scroll_back: 0,
            in_flight: 0,
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn url_draft(&self) -> &str {
        &self.url_draft
    }

    pub fn url_draft_mut(&mut self) -> &mut String {
        &mut self.url_draft
    }

    pub fn set_url_draft(&mut self, text: impl Into<String>) {
        self.url_draft = text.into();
    }

    /// True while a chat request is in flight
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn scroll_back(&self) -> usize {
        self.scroll_back
    }

    /// Send the chat draft together with the whole transcript.
    ///
    /// The user message is appended and the draft cleared before the request
    /// leaves. Blank drafts and submissions while a reply is pending are ignored.
    pub fn submit_chat(&mut self) -> Dispatch {
        if self.pending {
            tracing::debug!("chat submission ignored while a reply is pending");
            return Dispatch::Ignored;
        }

        let trimmed = self.draft.trim();
        if trimmed.is_empty() {
            return Dispatch::Ignored;
        }

        let message = Message::user(trimmed);
        self.push(message);
        self.draft.clear();
        self.pending = true;

        let messages = self.transcript.clone();
        tracing::info!(turns = messages.len(), "sending chat request");
        self.spawn(move |api| async move { Outcome::Chat(api.chat(&messages).await) });

        Dispatch::Sent
    }

    /// Ask the server to ingest the URL draft. No pending guard applies here.
    pub fn submit_url(&mut self) -> Dispatch {
        let url = self.url_draft.trim().to_string();
        if url.is_empty() {
            return Dispatch::Ignored;
        }

        tracing::info!(%url, "sending fetch-url request");
        self.spawn(move |api| async move { Outcome::Url(api.fetch_url(&url).await) });

        Dispatch::Sent
    }

    /// Upload the first file of `selection`; an empty selection does nothing.
    pub fn upload_file(&mut self, selection: &[PathBuf]) -> Dispatch {
        let Some(path) = selection.first().cloned() else {
            return Dispatch::Ignored;
        };

        tracing::info!(path = %path.display(), "sending upload request");
        self.spawn(move |api| async move { Outcome::Upload(api.upload(&path).await) });

        Dispatch::Sent
    }

    /// Apply every outcome that has already settled (called from the UI loop)
    pub fn process_outcomes(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.apply(outcome);
            applied += 1;
        }
        applied
    }

    /// Wait for the next request to settle and apply it.
    /// Returns `false` immediately when nothing is in flight.
    pub async fn settle(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }

        match self.outcome_rx.recv().await {
            Some(outcome) => {
                self.apply(outcome);
                true
            }
            None => false,
        }
    }

    /// Apply one settled request to the transcript
    fn apply(&mut self, outcome: Outcome) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match outcome {
            Outcome::Chat(result) => {
                let text = match result {
                    Ok(reply) => reply,
                    Err(e) => {
                        tracing::warn!(error = %e, "chat request failed");
                        CHAT_FAILED.to_string()
                    }
                };
                self.push(Message::assistant(text));
                self.pending = false;
            }
            Outcome::Url(result) => match result {
                Ok(message) => {
                    self.push(Message::assistant(message));
                    self.url_draft.clear();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "fetch-url request failed");
                    self.push(Message::assistant(URL_FAILED));
                }
            },
            Outcome::Upload(result) => {
                let text = match result {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::warn!(error = %e, "upload request failed");
                        UPLOAD_FAILED.to_string()
                    }
                };
                self.push(Message::assistant(text));
            }
        }
    }

    /// Show the most recent message
    pub fn scroll_to_latest(&mut self) {
        self.scroll_back = 0;
    }

    /// Scroll towards older messages, never past `max`
    pub fn scroll_up(&mut self, lines: usize, max: usize) {
        self.scroll_back = (self.scroll_back + lines).min(max);
    }

    /// Scroll towards newer messages
    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }

    fn push(&mut self, message: Message) {
        self.transcript.push(message);
        self.scroll_to_latest();
    }

    fn spawn<F, Fut>(&mut self, request: F)
    where
        F: FnOnce(ChatApi) -> Fut,
        Fut: std::future::Future<Output = Outcome> + Send + 'static,
    {
        let tx = self.outcome_tx.clone();
        let task = request(self.api.clone());
        self.in_flight += 1;

        tokio::spawn(async move {
            let _ = tx.send(task.await);
        });
    }
}
