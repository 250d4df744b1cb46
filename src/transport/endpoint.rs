use url::Url;

use crate::transport::error::TransportError;

/// Path of the duplex endpoint on the processing server.
pub const ENDPOINT_PATH: &str = "/ws";

/// Derive the WebSocket endpoint from the server origin.
///
/// `http` becomes `ws` and `https` becomes `wss`; WebSocket origins are kept.
/// The path is replaced with [`ENDPOINT_PATH`] and any query or fragment is
/// dropped.
pub fn endpoint_from_origin(origin: &str) -> Result<Url, TransportError> {
    let mut url = Url::parse(origin).map_err(|e| TransportError::InvalidOrigin {
        origin: origin.to_string(),
        reason: e.to_string(),
    })?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(TransportError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|()| TransportError::UnsupportedScheme(scheme.to_string()))?;

    if url.host_str().is_none() {
        return Err(TransportError::InvalidOrigin {
            origin: origin.to_string(),
            reason: "origin has no host".to_string(),
        });
    }

    url.set_path(ENDPOINT_PATH);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
