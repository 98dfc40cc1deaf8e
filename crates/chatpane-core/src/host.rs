//! Where the client believes it is served from
//!
//! The endpoint resolver only needs the origin, the scheme and the bare
//! hostname, so anything that can answer those three questions can host the
//! pipeline.

use anyhow::{Result, anyhow};
use reqwest::Url;

pub trait HostEnvironment: Send + Sync {
    /// `scheme://host[:port]`, without a trailing slash
    fn origin(&self) -> String;
    /// Scheme without the `:` suffix, e.g. `https`
    fn scheme(&self) -> String;
    /// Hostname without any port
    fn hostname(&self) -> String;
}

/// A host environment fixed to a configured origin URL
#[derive(Debug, Clone)]
pub struct StaticHost {
    url: Url,
}

impl StaticHost {
    pub fn parse(origin: &str) -> Result<Self> {
        let url = Url::parse(origin.trim())
            .map_err(|e| anyhow!("Invalid origin '{}': {}", origin, e))?;

        if url.host_str().is_none() {
            return Err(anyhow!("Origin '{}' has no host", origin));
        }

        Ok(Self { url })
    }
}

impl HostEnvironment for StaticHost {
    fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    fn scheme(&self) -> String {
        self.url.scheme().to_string()
    }

    fn hostname(&self) -> String {
        self.url.host_str().unwrap_or_default().to_string()
    }
}
