use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::DispatchError;
use crate::request::SendRequest;

#[derive(Clone, Default)]
pub struct ChatClient {
    client: Client,
}

impl ChatClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// POST one multipart request and decode the body as JSON.
    ///
    /// The status code is not treated as an error: a JSON error body is
    /// still a body, and the reply extractor falls back on its own.
    pub async fn send(&self, url: &str, request: &SendRequest) -> Result<Value, DispatchError> {
        let form = request.to_form().await?;

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| DispatchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, %status, "backend answered with an error status");
        } else {
            debug!(url, %status, "backend answered");
        }

        response.json::<Value>().await.map_err(|source| DispatchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
