use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retries a request that could not connect.
///
/// Only connection failures are retried: the request never reached the
/// server, so a metered endpoint cannot have billed it. Timeouts, broken
/// responses and error statuses are returned after the first attempt.
///
/// Runs at most `1 + retries` attempts, `delay_ms` apart.
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, reqwest::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) if err.is_connect() && attempt <= retries => {
                debug!(
                    "Connect attempt {}/{} failed: {}. Retrying...",
                    attempt, retries, err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_retry_gives_up_after_retries() {
        let calls = AtomicUsize::new(0);
        let client = reqwest::Client::new();

        // Nothing listens on port 1, so every attempt fails to connect
        let result = with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                client.get("http://127.0.0.1:1/").send()
            },
            2,
            1,
        )
        .await;

        assert!(result.unwrap_err().is_connect());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout_is_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        let result = with_retry(|| client.get(mock_server.uri()).send(), 3, 1).await;

        assert!(result.unwrap_err().is_timeout());
        let received = mock_server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
    }

    #[tokio::test]
    async fn test_error_status_is_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;
        let client = reqwest::Client::new();

        let response = with_retry(|| client.get(mock_server.uri()).send(), 3, 1)
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 503);
    }
}
