//! The send pipeline
//!
//! A send is split in three so a UI can stay responsive while the request is
//! in flight:
//!
//! 1. [`Dispatcher::prepare`] runs synchronously on submit. It validates,
//!    appends the user's message, updates the query history and resolves
//!    the endpoint.
//! 2. [`PendingReply::resolve`] performs the network round trip. It never
//!    fails: every error is folded into the reply text.
//! 3. [`Dispatcher::deliver`] appends the assistant's message.
//!
//! Replies of concurrent sends are delivered in whatever order they resolve.

use std::sync::Arc;

use tracing::{error, info};

use crate::client::ChatClient;
use crate::endpoint::resolve_endpoint;
use crate::host::HostEnvironment;
use crate::reply::{clean_reply, extract_reply, SEND_FAILED};
use crate::request::{Mode, SendRequest, Submission};
use crate::state::{ChatState, Message, ScrollRequest};

/// Outcome of one round trip, ready to append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Id of the user message this answers
    pub request_id: String,
    pub text: String,
    pub failed: bool,
}

/// A prepared request that has not been sent yet
pub struct PendingReply {
    request_id: String,
    url: String,
    request: SendRequest,
    client: ChatClient,
}

impl PendingReply {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn request(&self) -> &SendRequest {
        &self.request
    }

    /// Send the request and turn whatever comes back into reply text
    pub async fn resolve(self) -> Reply {
        let mode = self.request.mode;

        match self.client.send(&self.url, &self.request).await {
            Ok(body) => {
                let text = clean_reply(&extract_reply(mode, &body));
                info!(request_id = %self.request_id, mode = mode.as_str(), "reply received");
                Reply {
                    request_id: self.request_id,
                    text,
                    failed: false,
                }
            }
            Err(e) => {
                error!(request_id = %self.request_id, url = %self.url, error = %e, "send failed");
                Reply {
                    request_id: self.request_id,
                    text: SEND_FAILED.to_string(),
                    failed: true,
                }
            }
        }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    client: ChatClient,
    host: Arc<dyn HostEnvironment>,
}

impl Dispatcher {
    pub fn new(client: ChatClient, host: Arc<dyn HostEnvironment>) -> Self {
        Self { client, host }
    }

    /// Current target URL for the session's API version and port
    pub fn endpoint(&self, state: &ChatState) -> String {
        resolve_endpoint(
            self.host.as_ref(),
            state.session.api_version,
            &state.session.port,
        )
    }

    /// Synchronous half of a send. Returns `None` for an empty submission,
    /// in which case nothing was changed.
    pub fn prepare(&self, state: &mut ChatState, submission: Submission) -> Option<PendingReply> {
        let text = submission.text.trim();
        if text.is_empty() && submission.attachment.is_none() {
            return None;
        }

        let user_message = Message::user(text, submission.attachment.clone());
        let request_id = user_message.id.clone();
        state.transcript.append(user_message, ScrollRequest::Instant);

        // File-only queries record the empty string, like any other query
        if submission.mode == Mode::Query {
            state.history.record(state.prefs.as_mut(), text);
        }

        let request = SendRequest::new(
            text,
            submission.mode,
            submission.operation,
            state.session.selected_model.as_str(),
            submission.attachment,
        );
        let url = self.endpoint(state);

        info!(
            request_id = %request_id,
            url = %url,
            mode = request.mode.as_str(),
            has_file = request.file.is_some(),
            "dispatching message"
        );

        Some(PendingReply {
            request_id,
            url,
            request,
            client: self.client.clone(),
        })
    }

    /// Append a resolved reply to the transcript
    pub fn deliver<'a>(state: &'a mut ChatState, reply: Reply) -> &'a Message {
        state
            .transcript
            .append(Message::assistant(&reply.text), ScrollRequest::Smooth)
    }

    /// Whole pipeline in one call: prepare, await, deliver
    pub async fn send(&self, state: &mut ChatState, submission: Submission) {
        if let Some(pending) = self.prepare(state, submission) {
            let reply = pending.resolve().await;
            Self::deliver(state, reply);
        }
    }
}
