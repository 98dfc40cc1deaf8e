use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::request::Mode;

pub const NO_RESPONSE: &str = "No response received";
pub const SEND_FAILED: &str = "Error: Could not send message. Please try again.";

fn chunk_marker() -> &'static Regex {
    static CHUNK: OnceLock<Regex> = OnceLock::new();
    CHUNK.get_or_init(|| Regex::new(r"\s*\(Chunk[^)]*\)").expect("chunk pattern is valid"))
}

/// Pull the reply text out of a decoded response body.
///
/// Input mode answers under `message`, every other mode under `answer`.
/// Anything else, including an empty string, yields [`NO_RESPONSE`].
pub fn extract_reply(mode: Mode, body: &Value) -> String {
    let field = match mode {
        Mode::Input => "message",
        Mode::Query | Mode::Data => "answer",
    };

    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_RESPONSE)
        .to_string()
}

/// Remove `(Chunk ...)` source markers and surrounding whitespace
pub fn clean_reply(text: &str) -> String {
    chunk_marker().replace_all(text, "").trim().to_string()
}
