//! Transport bootstraps.
//!
//! - `websocket` - raw WebSocket, room from the path, full admission before
//!   the upgrade
//! - `socketio` - Socket.IO fallback, identity checked on connect
//!
//! Both read the credential from the `yauth` query parameter.

pub mod socketio;
pub mod websocket;

use axum::body::Body;
use axum::extract::Query;
use axum::http::{Request, Uri};
use tracing::Span;

/// Query parameter carrying the credential.
pub const CREDENTIAL_PARAM: &str = "yauth";

/// First `yauth` value in the request query, if any.
///
/// An unparseable query is treated as carrying no credential.
pub fn credential_from_uri(uri: &Uri) -> Option<String> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;
    pairs
        .into_iter()
        .find_map(|(name, value)| (name == CREDENTIAL_PARAM).then_some(value))
}

/// Request span without the query string, which carries the credential.
pub(crate) fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "http.request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}
