use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::protocol::{ChatOutcome, ChatRequest, PlainChatBody, decode_reply};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid endpoint `{0}`")]
    InvalidEndpoint(String),
    #[error("could not reach {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read attachment {}: {source}", path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("server answered {status} {reason}")]
    Status { status: u16, reason: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl From<Result<String, ChatError>> for ChatOutcome {
    fn from(result: Result<String, ChatError>) -> Self {
        match result {
            Ok(text) => Self::Success(text),
            Err(ChatError::Status { status, reason }) => Self::ProtocolError { status, reason },
            Err(ChatError::Decode(detail)) => Self::ParseError(detail),
            Err(
                err @ (ChatError::InvalidEndpoint(_)
                | ChatError::Transport { .. }
                | ChatError::Attachment { .. }),
            ) => Self::TransportError(err.to_string()),
        }
    }
}

/// Performs one blocking chat round trip.
pub trait ChatBackend: Send + Sync {
    fn post(&self, request: &ChatRequest) -> Result<String, ChatError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: Client,
    endpoint: String,
}

impl HttpChatBackend {
    pub fn new(
        endpoint: impl Into<String>,
        connect_timeout: Option<Duration>,
    ) -> Result<Self, ChatError> {
        let endpoint = endpoint.into();
        reqwest::Url::parse(&endpoint).map_err(|_| ChatError::InvalidEndpoint(endpoint.clone()))?;
        let mut builder = Client::builder().timeout(None);
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build().map_err(|source| ChatError::Transport {
            endpoint: endpoint.clone(),
            source,
        })?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `GET /health` on the same host as the chat endpoint.
    pub fn check_health(&self) -> Result<HealthStatus, ChatError> {
        let url = reqwest::Url::parse(&self.endpoint)
            .and_then(|base| base.join("/health"))
            .map_err(|_| ChatError::InvalidEndpoint(self.endpoint.clone()))?;
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| self.transport_error(source))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }
        let body = response
            .text()
            .map_err(|source| self.transport_error(source))?;
        serde_json::from_str(&body).map_err(|err| ChatError::Decode(err.to_string()))
    }

    fn build_request(&self, request: &ChatRequest) -> Result<RequestBuilder, ChatError> {
        match request {
            ChatRequest::Plain { message } => Ok(self
                .client
                .post(&self.endpoint)
                .json(&PlainChatBody { message })),
            ChatRequest::FileAugmented {
                message,
                file,
                user_id,
                session_id,
            } => {
                let bytes = file.read_bytes().map_err(|source| ChatError::Attachment {
                    path: file.path().to_path_buf(),
                    source,
                })?;
                debug!(file = file.name(), bytes = bytes.len(), "building multipart body");
                let part = Part::bytes(bytes)
                    .file_name(file.name().to_string())
                    .mime_str(&file.mime_type())
                    .map_err(|source| self.transport_error(source))?;
                let form = Form::new()
                    .part("file", part)
                    .text("message", message.clone())
                    .text("user_id", user_id.clone())
                    .text("session_id", session_id.clone());
                Ok(self.client.post(&self.endpoint).multipart(form))
            }
        }
    }

    fn transport_error(&self, source: reqwest::Error) -> ChatError {
        ChatError::Transport {
            endpoint: self.endpoint.clone(),
            source,
        }
    }
}

impl ChatBackend for HttpChatBackend {
    fn post(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let response = self
            .build_request(request)?
            .send()
            .map_err(|source| self.transport_error(source))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|source| self.transport_error(source))?;
        if !status.is_success() {
            warn!(status = status.as_u16(), %body, "chat endpoint returned an error status");
            return Err(ChatError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }
        decode_reply(request.variant(), &body).map_err(ChatError::Decode)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterEvent {
    pub outcome: ChatOutcome,
    pub elapsed: Duration,
}

/// Runs each request on its own worker thread and hands the settled outcome
/// back to the UI loop over a channel.
pub struct ChatAdapter {
    backend: Arc<dyn ChatBackend>,
    event_tx: Sender<AdapterEvent>,
    event_rx: Receiver<AdapterEvent>,
}

impl ChatAdapter {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            backend,
            event_tx,
            event_rx,
        }
    }

    pub fn send(&self, request: ChatRequest) {
        let backend = Arc::clone(&self.backend);
        let tx = self.event_tx.clone();
        thread::spawn(move || {
            let started = Instant::now();
            info!(
                variant = ?request.variant(),
                message_chars = request.message().chars().count(),
                "dispatching chat request"
            );
            let outcome = ChatOutcome::from(backend.post(&request));
            let _ = tx.send(AdapterEvent {
                outcome,
                elapsed: started.elapsed(),
            });
        });
    }

    pub fn drain_events_limited(&self, max_events: usize) -> Vec<AdapterEvent> {
        let mut events = Vec::new();
        while events.len() < max_events {
            let Ok(event) = self.event_rx.try_recv() else {
                break;
            };
            events.push(event);
        }
        events
    }

    /// Blocks until the next request settles.
    pub fn wait_event(&self) -> Option<AdapterEvent> {
        self.event_rx.recv().ok()
    }
}

#[cfg(test)]
#[path = "../tests/unit/client_tests.rs"]
mod tests;
