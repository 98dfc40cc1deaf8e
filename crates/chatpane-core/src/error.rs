use std::path::PathBuf;

use thiserror::Error;

/// Failures between building the payload and decoding the reply.
/// None of these reach the caller; they become one error message in the
/// transcript.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("could not read attachment {path}: {source}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("response from {url} is not JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
