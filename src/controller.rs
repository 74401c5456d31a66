use tracing::{debug, info, warn};

use crate::attachment::AttachedFile;
use crate::protocol::{ChatOutcome, ChatRequest, Variant};
use crate::transcript::{Role, Transcript, Turn};

/// Identifiers sent with every file-augmented request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: String,
    pub session_id: String,
}

impl Default for SessionIdentity {
    fn default() -> Self {
        Self {
            user_id: "chat-relay-user".to_string(),
            session_id: "chat-relay-session".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejection {
    Busy,
    MissingFile,
    EmptyMessage,
}

impl SubmitRejection {
    pub fn notice(self) -> &'static str {
        match self {
            Self::Busy => "Still waiting for the previous reply.",
            Self::MissingFile => "Please upload a file first.",
            Self::EmptyMessage => "Please enter a message to continue.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayTurn {
    Welcome(String),
    Turn(Turn),
    Typing,
}

/// Owns the transcript, the composing buffer, the attachment and the busy
/// gate. Every mutation goes through `submit`, `attach_file`, `settle` or the
/// pending-text setters.
#[derive(Debug)]
pub struct ChatController {
    variant: Variant,
    identity: SessionIdentity,
    transcript: Transcript,
    pending_text: String,
    attached_file: Option<AttachedFile>,
    busy: bool,
}

impl ChatController {
    pub fn new(variant: Variant, identity: SessionIdentity) -> Self {
        Self {
            variant,
            identity,
            transcript: Transcript::default(),
            pending_text: String::new(),
            attached_file: None,
            busy: false,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn pending_text(&self) -> &str {
        &self.pending_text
    }

    pub fn set_pending_text(&mut self, text: impl Into<String>) {
        self.pending_text = text.into();
    }

    pub fn pending_text_mut(&mut self) -> &mut String {
        &mut self.pending_text
    }

    pub fn attached_file(&self) -> Option<&AttachedFile> {
        self.attached_file.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Input controls accept a send only when idle and, for the file variant,
    /// once a file is attached.
    pub fn input_enabled(&self) -> bool {
        !self.busy && (!self.variant.requires_file() || self.attached_file.is_some())
    }

    /// Replaces the attachment. Returns false for the plain variant, which has
    /// no file slot.
    pub fn attach_file(&mut self, file: AttachedFile) -> bool {
        if !self.variant.requires_file() {
            warn!(file = %file.path().display(), "ignoring attachment for plain chat");
            return false;
        }
        info!(file = %file.path().display(), "attached file");
        self.attached_file = Some(file);
        true
    }

    pub fn submit_pending(&mut self) -> Result<ChatRequest, SubmitRejection> {
        let text = self.pending_text.clone();
        self.submit(text, None)
    }

    /// Accepts a turn and returns the single request to dispatch for it.
    ///
    /// The busy gate is checked and raised here, before anything leaves the
    /// controller, so a second call before `settle` is always rejected. A
    /// rejected call leaves every field untouched, including the attachment.
    pub fn submit(
        &mut self,
        text: impl Into<String>,
        file: Option<AttachedFile>,
    ) -> Result<ChatRequest, SubmitRejection> {
        let text = text.into();
        if self.busy {
            debug!("submit rejected: request already in flight");
            return Err(SubmitRejection::Busy);
        }
        let file = file.or_else(|| self.attached_file.clone());
        if self.variant.requires_file() && file.is_none() {
            debug!("submit rejected: no file attached");
            return Err(SubmitRejection::MissingFile);
        }
        if text.trim().is_empty() {
            debug!("submit rejected: empty message");
            return Err(SubmitRejection::EmptyMessage);
        }

        let request = match (self.variant, file) {
            (Variant::FileAugmented, Some(file)) => {
                let request = ChatRequest::FileAugmented {
                    message: text.clone(),
                    file: file.clone(),
                    user_id: self.identity.user_id.clone(),
                    session_id: self.identity.session_id.clone(),
                };
                self.attach_file(file);
                request
            }
            (Variant::FileAugmented, None) => return Err(SubmitRejection::MissingFile),
            (Variant::Plain, _) => ChatRequest::Plain {
                message: text.clone(),
            },
        };

        self.transcript.push(Turn::user(text));
        self.pending_text.clear();
        self.busy = true;
        info!(turns = self.transcript.len(), "submitted chat turn");
        Ok(request)
    }

    /// Records how the in-flight request ended and reopens the gate.
    pub fn settle(&mut self, outcome: ChatOutcome) {
        if !self.busy {
            warn!(?outcome, "dropping settle with no request in flight");
            return;
        }
        match &outcome {
            ChatOutcome::Success(_) => info!("chat request succeeded"),
            ChatOutcome::TransportError(detail) => {
                warn!(%detail, "chat request failed to reach server")
            }
            ChatOutcome::ProtocolError { status, reason } => {
                warn!(status, %reason, "chat request rejected by server")
            }
            ChatOutcome::ParseError(detail) => {
                warn!(%detail, "chat response had an unexpected shape")
            }
        }
        self.transcript
            .push(Turn::agent(outcome.turn_text(self.variant)));
        self.busy = false;
    }

    /// What the transcript view should show, newest last.
    pub fn display_turns(&self) -> Vec<DisplayTurn> {
        let mut out: Vec<DisplayTurn> = self
            .transcript
            .turns()
            .iter()
            .cloned()
            .map(DisplayTurn::Turn)
            .collect();
        if self.transcript.is_empty() && !self.busy {
            out.push(DisplayTurn::Welcome(self.variant.welcome_text().to_string()));
        }
        if self.busy {
            out.push(DisplayTurn::Typing);
        }
        out
    }

    pub fn role_label(&self, role: Role) -> &'static str {
        match role {
            Role::User => "You:",
            Role::Agent => self.variant.agent_label(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/controller_tests.rs"]
mod tests;
