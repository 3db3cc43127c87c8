use crate::config::Config;
use crate::events::Message;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::time::Duration;

/// Failure of one outbound request
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("malformed response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    reply: String,
}

#[derive(Debug, Serialize)]
struct UrlRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct Notice {
    message: String,
}

/// Client for the chat, URL-ingestion and upload endpoints
#[derive(Clone)]
pub struct ChatApi {
    client: reqwest::Client,
    chat_url: String,
    fetch_url_url: String,
    upload_url: String,
}

impl ChatApi {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(ApiError::Client)?;

        Ok(Self {
            client,
            chat_url: config.chat_url(),
            fetch_url_url: config.fetch_url_url(),
            upload_url: config.upload_url(),
        })
    }

    /// Send the full transcript and return the assistant reply
    pub async fn chat(&self, messages: &[Message]) -> Result<String, ApiError> {
        let request = self
            .client
            .post(&self.chat_url)
            .json(&ChatRequest { messages });
        let reply: ChatReply = Self::send(&self.chat_url, request).await?;
        Ok(reply.reply)
    }

    /// Ask the server to ingest a web page
    pub async fn fetch_url(&self, url: &str) -> Result<String, ApiError> {
        let request = self
            .client
            .post(&self.fetch_url_url)
            .json(&UrlRequest { url });
        let notice: Notice = Self::send(&self.fetch_url_url, request).await?;
        Ok(notice.message)
    }

    /// Upload a file as the multipart field `file`
    pub async fn upload(&self, path: &Path) -> Result<String, ApiError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ApiError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        tracing::debug!(file = %file_name, size = bytes.len(), "uploading file");

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let request = self.client.post(&self.upload_url).multipart(form);
        let notice: Notice = Self::send(&self.upload_url, request).await?;
        Ok(notice.message)
    }

    async fn send<T: DeserializeOwned>(
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let transport = |source: reqwest::Error| ApiError::Transport {
            url: url.to_string(),
            source,
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
