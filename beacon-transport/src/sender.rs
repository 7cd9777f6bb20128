use beacon_core::EncodedRequest;
use std::time::Duration;
use tracing::{debug, trace};

/// Blocking-path HTTP delivery.
///
/// The collector acknowledges an accepted event with a response body of
/// exactly `1`; anything else, including transport failures, is reported as
/// `false`. This path never raises: in best-effort delivery a lost event is
/// an expected outcome, not an exceptional one.
#[derive(Debug)]
pub struct HttpSender {
    http: reqwest::Client,
}

impl HttpSender {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpSender { http })
    }

    /// Deliver one request and interpret the collector's verdict.
    pub async fn deliver(&self, request: &EncodedRequest) -> bool {
        match self.fetch_body(request.url()).await {
            Ok(body) => {
                trace!(endpoint = %request.endpoint(), body = %body, "collector responded");
                body == "1"
            }
            Err(err) => {
                debug!(endpoint = %request.endpoint(), error = %err, "delivery failed");
                false
            }
        }
    }

    /// Deliver a raw URL line the worker pulled off its channel.
    pub(crate) async fn deliver_url(&self, url: &str) -> bool {
        match self.fetch_body(url).await {
            Ok(body) => body == "1",
            Err(err) => {
                debug!(error = %err, "background delivery failed");
                false
            }
        }
    }

    async fn fetch_body(&self, url: &str) -> Result<String, reqwest::Error> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        response.text().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::{encode, Endpoint};
    use serde_json::json;

    fn request_for(server: &mockito::ServerGuard) -> EncodedRequest {
        let base = format!("{}/", server.url());
        encode(&base, Endpoint::Track, &json!({"event": "e"})).unwrap()
    }

    fn sender() -> HttpSender {
        HttpSender::new(Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_body_one_is_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Regex(r"^/track/.*".to_string()))
            .with_body("1")
            .create_async()
            .await;

        assert!(sender().deliver(&request_for(&server)).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_other_bodies_are_failure() {
        for body in ["0", "", "1 "] {
            let mut server = mockito::Server::new_async().await;
            let _mock = server
                .mock("GET", mockito::Matcher::Regex(r"^/track/.*".to_string()))
                .with_body(body)
                .create_async()
                .await;

            assert!(
                !sender().deliver(&request_for(&server)).await,
                "body {:?} must not count as success",
                body
            );
        }
    }

    #[tokio::test]
    async fn test_server_error_is_failure_not_panic() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Regex(r"^/track/.*".to_string()))
            .with_status(500)
            .with_body("1")
            .create_async()
            .await;

        assert!(!sender().deliver(&request_for(&server)).await);
    }

    #[tokio::test]
    async fn test_connection_refused_is_failure_not_panic() {
        // Nothing listens on this port.
        let request = encode(
            "http://127.0.0.1:9/",
            Endpoint::Track,
            &json!({"event": "e"}),
        )
        .unwrap();

        assert!(!sender().deliver(&request).await);
    }
}
