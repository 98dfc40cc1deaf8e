use crate::host::HostEnvironment;
use crate::session::ApiVersion;

/// Target URL for a send.
///
/// With a port configured the request goes to `scheme://host:port/chatN`,
/// otherwise to `origin/chatN`.
pub fn resolve_endpoint(host: &dyn HostEnvironment, version: ApiVersion, port: &str) -> String {
    let path = version.path_segment();
    let port = port.trim();

    if port.is_empty() {
        format!("{}/{}", host.origin(), path)
    } else {
        format!("{}://{}:{}/{}", host.scheme(), host.hostname(), port, path)
    }
}
