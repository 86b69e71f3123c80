//! Mock permission service backed by wiremock.
//!
//! Served under a `/perm` prefix so tests also cover base paths.

use serde_json::Value;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASE_PATH: &str = "/perm";

pub struct MockPermissionService {
    server: MockServer,
}

impl MockPermissionService {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Value for `AUTH_PERM_CALLBACK`, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.server.uri(), BASE_PATH)
    }

    /// Answer `GET /perm/{room}/{user_id}` with `body`, exactly once.
    pub async fn grant(&self, room: &str, user_id: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("{BASE_PATH}/{room}/{user_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Answer every request with `status`.
    pub async fn fail_with(&self, status: u16) {
        Mock::given(any())
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Fail the test (on drop) if any request arrives.
    pub async fn expect_no_requests(&self) {
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    /// Number of requests received so far.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}
