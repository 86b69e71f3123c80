//! Permission service client.
//!
//! Asks `GET {base}/{room}/{userId}` what a verified user may do in a room.
//!
//! # Security
//!
//! - Fails closed: any transport, status or body problem denies admission
//! - No retries and no caching; every admission asks again
//! - Requests carry no credential; logs carry room and URL only

use crate::errors::{GateError, StartupError};
use crate::models::{AccessDescriptor, AccessQuery, PermissionResponse};
use crate::observability::metrics;
use reqwest::{Client, Url};
use std::time::{Duration, Instant};
use tracing::{error, instrument, warn};

/// Resolves room access for verified users.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    client: Client,

    /// Normalized to end with `/`.
    base_url: Url,
}

impl PermissionResolver {
    /// Create a resolver for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// - `StartupError::PermCallbackUrl` if `base_url` is not an absolute
    ///   http(s) URL
    /// - `StartupError::HttpClient` if the HTTP client cannot be built
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StartupError> {
        let base_url = normalize_base_url(base_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                error!(target: "gate.authz", error = %e, "Failed to build HTTP client");
                StartupError::HttpClient(e.to_string())
            })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL consulted for `query`. Room and user id are appended as
    /// percent-encoded path segments.
    ///
    /// # Errors
    ///
    /// `.` and `..` are path navigation, not segments, and would address a
    /// different resource:
    /// - `GateError::InvalidRoom` if the room is one of them
    /// - `GateError::InvalidCredential` if the user id is one of them
    pub fn permission_url(&self, query: &AccessQuery) -> Result<Url, GateError> {
        if is_dot_segment(&query.room) {
            return Err(GateError::InvalidRoom);
        }
        if is_dot_segment(&query.user_id) {
            return Err(GateError::InvalidCredential);
        }

        let mut url = self.base_url.clone();
        // Always Ok: cannot-be-a-base URLs are rejected at construction.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&query.room)
                .push(&query.user_id);
        }
        Ok(url)
    }

    /// Ask the service what `user_id` may do in `room`.
    ///
    /// # Errors
    ///
    /// - `GateError::InvalidRoom` / `GateError::InvalidCredential` if the
    ///   query cannot be addressed (see [`Self::permission_url`]); the
    ///   service is not contacted
    /// - `GateError::PermissionServiceUnavailable` on network failure,
    ///   timeout, non-2xx status or a malformed body
    #[instrument(skip_all, fields(room = %room))]
    pub async fn resolve(&self, room: &str, user_id: &str) -> Result<AccessDescriptor, GateError> {
        let query = AccessQuery::new(room, user_id);
        let url = match self.permission_url(&query) {
            Ok(url) => url,
            Err(e) => {
                warn!(
                    target: "gate.authz",
                    room = %query.room,
                    reason = e.kind(),
                    "Refusing unaddressable permission query"
                );
                return Err(e);
            }
        };
        let start = Instant::now();

        let result = self.fetch(&query, &url).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(LookupFailure::Timeout) => "timeout",
            Err(_) => "error",
        };
        metrics::record_permission_lookup(outcome, start.elapsed());

        match result {
            Ok(response) => Ok(response.into_descriptor(query)),
            Err(failure) => Err(GateError::PermissionServiceUnavailable(
                failure.reason().to_string(),
            )),
        }
    }

    async fn fetch(
        &self,
        query: &AccessQuery,
        url: &Url,
    ) -> Result<PermissionResponse, LookupFailure> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            error!(
                target: "gate.authz",
                room = %query.room,
                url = %url,
                error = %e,
                "Failed to pull permissions"
            );
            if e.is_timeout() {
                LookupFailure::Timeout
            } else {
                LookupFailure::Unreachable
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                target: "gate.authz",
                room = %query.room,
                url = %url,
                status = %status,
                "Permission service returned an error status"
            );
            return Err(LookupFailure::Status);
        }

        response.json::<PermissionResponse>().await.map_err(|e| {
            error!(
                target: "gate.authz",
                room = %query.room,
                url = %url,
                error = %e,
                "Failed to parse permission response"
            );
            if e.is_timeout() {
                LookupFailure::Timeout
            } else {
                LookupFailure::MalformedBody
            }
        })
    }
}

#[derive(Debug)]
enum LookupFailure {
    Unreachable,
    Timeout,
    Status,
    MalformedBody,
}

impl LookupFailure {
    fn reason(&self) -> &'static str {
        match self {
            LookupFailure::Unreachable => "permission service unreachable",
            LookupFailure::Timeout => "permission service timed out",
            LookupFailure::Status => "permission service returned an error status",
            LookupFailure::MalformedBody => "permission service returned a malformed body",
        }
    }
}

fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

fn normalize_base_url(raw: &str) -> Result<Url, StartupError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| StartupError::PermCallbackUrl(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(StartupError::PermCallbackUrl(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }

    // Room and user are appended below the base path; a query stays a query.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_fragment(None);

    Ok(url)
}
