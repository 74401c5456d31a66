use serde::{Deserialize, Serialize};

use crate::attachment::AttachedFile;

pub const PLAIN_TRANSPORT_ERROR_TEXT: &str = "Sorry, something went wrong.";
pub const FILE_TRANSPORT_ERROR_TEXT: &str = "Error: Could not connect to the server.";
pub const PARSE_ERROR_TEXT: &str = "Error: Unexpected response from the server.";

/// Which chat front end is running. The two share the controller but differ
/// in wire format, file requirements and wording.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Multipart upload of a data file alongside each message.
    #[value(name = "file")]
    #[serde(rename = "file")]
    FileAugmented,
    /// JSON `{ "message": ... }` round trip.
    #[default]
    Plain,
}

impl Variant {
    pub fn requires_file(self) -> bool {
        matches!(self, Self::FileAugmented)
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            Self::FileAugmented => "http://localhost:8001/chat",
            Self::Plain => "http://localhost:8000/chat",
        }
    }

    pub fn default_title(self) -> &'static str {
        match self {
            Self::FileAugmented => "Data Analyst Chat",
            Self::Plain => "Agent Chat",
        }
    }

    pub fn agent_label(self) -> &'static str {
        match self {
            Self::FileAugmented => "Bot:",
            Self::Plain => "Agent:",
        }
    }

    pub fn welcome_text(self) -> &'static str {
        match self {
            Self::FileAugmented => {
                "Hello! Please upload a CSV, JSON, or XLSX file and ask a question to begin."
            }
            Self::Plain => "Hello! Type a message and press Enter to begin.",
        }
    }

    pub fn transport_error_text(self) -> &'static str {
        match self {
            Self::FileAugmented => FILE_TRANSPORT_ERROR_TEXT,
            Self::Plain => PLAIN_TRANSPORT_ERROR_TEXT,
        }
    }
}

/// One outbound chat call, fully described before any I/O happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRequest {
    Plain {
        message: String,
    },
    FileAugmented {
        message: String,
        file: AttachedFile,
        user_id: String,
        session_id: String,
    },
}

impl ChatRequest {
    pub fn variant(&self) -> Variant {
        match self {
            Self::Plain { .. } => Variant::Plain,
            Self::FileAugmented { .. } => Variant::FileAugmented,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Plain { message } | Self::FileAugmented { message, .. } => message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlainChatBody<'a> {
    pub message: &'a str,
}

#[derive(Debug, Deserialize)]
struct PlainChatResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct FileChatResponse {
    responses: Vec<String>,
}

/// How a submitted request settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Success(String),
    TransportError(String),
    ProtocolError { status: u16, reason: String },
    ParseError(String),
}

impl ChatOutcome {
    /// Text of the agent turn this outcome produces.
    pub fn turn_text(&self, variant: Variant) -> String {
        match self {
            Self::Success(text) => text.clone(),
            Self::TransportError(_) => variant.transport_error_text().to_string(),
            Self::ProtocolError { status, reason } => {
                if reason.is_empty() {
                    format!("Error: {status}")
                } else {
                    format!("Error: {reason}")
                }
            }
            Self::ParseError(_) => PARSE_ERROR_TEXT.to_string(),
        }
    }
}

/// Pulls the reply text out of a 2xx body.
pub fn decode_reply(variant: Variant, body: &str) -> Result<String, String> {
    match variant {
        Variant::Plain => serde_json::from_str::<PlainChatResponse>(body)
            .map(|parsed| parsed.response)
            .map_err(|err| err.to_string()),
        Variant::FileAugmented => {
            let parsed: FileChatResponse =
                serde_json::from_str(body).map_err(|err| err.to_string())?;
            parsed
                .responses
                .into_iter()
                .next()
                .ok_or_else(|| "responses array is empty".to_string())
        }
    }
}
