/*!
Stub SOFA feed server

Serves a feed the way the real endpoint does: 200 with an ETag, 304 when the
client presents that ETag in `If-None-Match`. Failure modes (error statuses,
slow responses) can be swapped in between requests. Every request is
recorded so tests can inspect the headers the agent sent.
*/

use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const FEED_PATH: &str = "/v1/macos_data_feed.json";

pub struct FeedStub {
    server: MockServer,
}

impl FeedStub {
    pub async fn start() -> Self {
        Self { server: MockServer::start().await }
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.server.uri(), FEED_PATH)
    }

    /// Serve `body`; with an ETag, answer 304 to requests presenting it
    pub async fn serve_feed(&self, body: impl Into<String>, etag: Option<&str>) {
        self.server.reset().await;

        let mut fresh = ResponseTemplate::new(200)
            .set_body_string(body.into())
            .insert_header("Content-Type", "application/json");

        if let Some(etag) = etag {
            fresh = fresh.insert_header("ETag", etag);

            Mock::given(method("GET"))
                .and(path(FEED_PATH))
                .and(header("If-None-Match", etag))
                .respond_with(ResponseTemplate::new(304).insert_header("ETag", etag))
                .with_priority(1)
                .mount(&self.server)
                .await;
        }

        Mock::given(method("GET"))
            .and(path(FEED_PATH))
            .respond_with(fresh)
            .mount(&self.server)
            .await;

        tracing::info!("📡 [STUB] Serving feed (etag: {:?})", etag);
    }

    /// Always answer 304, whatever the client sent
    pub async fn serve_not_modified(&self) {
        self.serve_status(304).await;
    }

    /// Answer every request with `status` and no body
    pub async fn serve_status(&self, status: u16) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(FEED_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
        tracing::info!("📡 [STUB] Serving HTTP {}", status);
    }

    /// Serve `body` only after `delay`
    pub async fn serve_slow(&self, body: impl Into<String>, delay: Duration) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(FEED_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.into()).set_delay(delay))
            .mount(&self.server)
            .await;
    }

    /// Number of requests received since the last reconfiguration
    pub async fn request_count(&self) -> usize {
        self.server.received_requests().await.map(|r| r.len()).unwrap_or(0)
    }

    /// `If-None-Match` of each request received since the last reconfiguration
    pub async fn if_none_match_headers(&self) -> Vec<Option<String>> {
        self.request_header("If-None-Match").await
    }

    pub async fn user_agents(&self) -> Vec<Option<String>> {
        self.request_header("User-Agent").await
    }

    async fn request_header(&self, name: &str) -> Vec<Option<String>> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|req| {
                req.headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            })
            .collect()
    }
}

/// URL of a loopback port with nothing listening
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}{}", port, FEED_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn get(url: &str, etag: Option<&str>) -> (u16, String) {
        let mut request = reqwest::Client::new().get(url);
        if let Some(etag) = etag {
            request = request.header("If-None-Match", etag);
        }
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.text().await.unwrap())
    }

    #[tokio::test]
    async fn test_stub_honours_etag() {
        let stub = FeedStub::start().await;
        stub.serve_feed(r#"{"OSVersions":[]}"#, Some("\"v1\"")).await;

        let (status, body) = get(&stub.url(), None).await;
        assert_eq!(status, 200);
        assert!(body.contains("OSVersions"));

        let (status, _) = get(&stub.url(), Some("\"v1\"")).await;
        assert_eq!(status, 304);

        let (status, _) = get(&stub.url(), Some("\"v0\"")).await;
        assert_eq!(status, 200);

        assert_eq!(stub.request_count().await, 3);
        assert_eq!(
            stub.if_none_match_headers().await,
            vec![None, Some("\"v1\"".to_string()), Some("\"v0\"".to_string())]
        );
    }

    #[tokio::test]
    async fn test_stub_error_status() {
        let stub = FeedStub::start().await;
        stub.serve_status(503).await;

        let (status, _) = get(&stub.url(), None).await;
        assert_eq!(status, 503);
    }
}
