use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};

use crate::config::DdnsConfig;
use crate::provider::{DnsProvider, RecordUpsert};
use crate::response::Response;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Inputs extracted from one inbound update call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRequest {
    /// Address reported by the fronting proxy.
    pub client_address: Option<String>,
    pub hostname: Option<String>,
    pub token: Option<String>,
}

/// Validates update requests and turns accepted ones into a single upsert.
///
/// Every outcome, including rejections and provider failures, comes back as
/// a [`Response`]; nothing here fails at the transport level.
pub struct UpdateHandler {
    config: DdnsConfig,
    provider: Arc<dyn DnsProvider>,
    timeout: Duration,
}

impl UpdateHandler {
    pub fn new(config: DdnsConfig, provider: Arc<dyn DnsProvider>) -> Self {
        Self {
            config,
            provider,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn handle(&self, request: &UpdateRequest) -> Response {
        if !self.config.is_complete() {
            error!("Update token or hosted zone id is not configured");
            return Response::error("Missing required configuration");
        }

        let client_address = match request.client_address.as_deref() {
            Some(address) if !address.is_empty() => address,
            _ => {
                warn!("Rejected update without a client address");
                return Response::error("Unknown client address");
            }
        };

        let hostname = request.hostname.as_deref().unwrap_or_default();
        let token = request.token.as_deref().unwrap_or_default();

        info!("checking request from {} for {}", client_address, hostname);
        if !tokens_match(token, &self.config.update_token) {
            warn!("Invalid update token from {} for {}", client_address, hostname);
            return Response::error("Invalid update token");
        }

        let zone_id = &self.config.hosted_zone_id;
        info!("updating {} in zone {}", hostname, zone_id);

        let change = RecordUpsert::a_record(zone_id.as_str(), hostname, client_address);
        let outcome = tokio::time::timeout(self.timeout, self.provider.upsert_record(&change)).await;

        match outcome {
            Ok(Ok(result)) => Response::success(format!("Updated address for {}", hostname))
                .with_host_info(hostname, client_address)
                .with_result(result),
            Ok(Err(e)) => {
                error!("DNS update failed for {}: {}", hostname, e);
                Response::error("Failed to update record").with_result(e.to_string())
            }
            Err(_) => {
                error!("DNS update for {} timed out after {:?}", hostname, self.timeout);
                Response::error("Failed to update record")
                    .with_result(format!("request timed out after {:?}", self.timeout))
            }
        }
    }
}

/// Exact, case-sensitive comparison that doesn't stop at the first mismatch.
fn tokens_match(provided: &str, expected: &str) -> bool {
    let (a, b) = (provided.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::provider::{self, RecordType};
    use crate::response::Status;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every change it is asked to make.
    pub(crate) struct FakeProvider {
        pub calls: Mutex<Vec<RecordUpsert>>,
        reply: Result<String, String>,
        delay: Option<Duration>,
    }

    impl FakeProvider {
        pub fn accepting(result: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply: Ok(result.to_string()),
                delay: None,
            })
        }

        pub fn rejecting(detail: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply: Err(detail.to_string()),
                delay: None,
            })
        }

        fn stalling(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply: Ok("late".to_string()),
                delay: Some(delay),
            })
        }

        pub fn calls(&self) -> Vec<RecordUpsert> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DnsProvider for FakeProvider {
        async fn upsert_record(&self, change: &RecordUpsert) -> Result<String, provider::Error> {
            self.calls.lock().unwrap().push(change.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply.clone().map_err(provider::Error::Api)
        }
    }

    fn request(address: &str, hostname: &str, token: &str) -> UpdateRequest {
        UpdateRequest {
            client_address: Some(address.to_string()),
            hostname: Some(hostname.to_string()),
            token: Some(token.to_string()),
        }
    }

    fn handler(provider: Arc<FakeProvider>) -> UpdateHandler {
        UpdateHandler::new(DdnsConfig::new("abc123", "Z123"), provider)
    }

    #[tokio::test]
    async fn accepted_update_upserts_one_a_record() {
        let provider = FakeProvider::accepting("ChangeInfo { status: Pending }");
        let resp = handler(provider.clone())
            .handle(&request("203.0.113.7", "home.example.com", "abc123"))
            .await;

        assert_eq!(resp.status, Status::Success);
        assert_eq!(resp.message, "Updated address for home.example.com");
        assert_eq!(resp.hostname.as_deref(), Some("home.example.com"));
        assert_eq!(resp.address.as_deref(), Some("203.0.113.7"));
        assert_eq!(resp.result.as_deref(), Some("ChangeInfo { status: Pending }"));

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].zone_id, "Z123");
        assert_eq!(calls[0].name, "home.example.com");
        assert_eq!(calls[0].record_type, RecordType::A);
        assert_eq!(calls[0].ttl, 300);
        assert_eq!(calls[0].value, "203.0.113.7");
    }

    #[tokio::test]
    async fn missing_configuration_is_checked_first() {
        for config in [DdnsConfig::new("", "Z123"), DdnsConfig::new("abc123", "")] {
            let provider = FakeProvider::accepting("ok");
            let resp = UpdateHandler::new(config, provider.clone())
                .handle(&UpdateRequest::default())
                .await;

            assert_eq!(resp.status, Status::Error);
            assert_eq!(resp.message, "Missing required configuration");
            assert!(provider.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn empty_client_address_is_rejected() {
        let provider = FakeProvider::accepting("ok");
        let handler = handler(provider.clone());

        let resp = handler.handle(&request("", "home.example.com", "abc123")).await;
        assert_eq!(resp.message, "Unknown client address");

        let mut no_header = request("", "home.example.com", "abc123");
        no_header.client_address = None;
        let resp = handler.handle(&no_header).await;
        assert_eq!(resp.status, Status::Error);
        assert_eq!(resp.message, "Unknown client address");
        assert_eq!(resp.hostname, None);

        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn wrong_or_missing_token_is_rejected() {
        let provider = FakeProvider::accepting("ok");
        let handler = handler(provider.clone());

        for token in ["wrong", "ABC123", "abc1234", ""] {
            let resp = handler
                .handle(&request("203.0.113.7", "home.example.com", token))
                .await;
            assert_eq!(resp.status, Status::Error);
            assert_eq!(resp.message, "Invalid update token");
        }

        let mut no_token = request("203.0.113.7", "home.example.com", "");
        no_token.token = None;
        let resp = handler.handle(&no_token).await;
        assert_eq!(resp.message, "Invalid update token");

        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_reported_without_retry() {
        let provider = FakeProvider::rejecting("InvalidChangeBatch: bad zone");
        let resp = handler(provider.clone())
            .handle(&request("203.0.113.7", "home.example.com", "abc123"))
            .await;

        assert_eq!(resp.status, Status::Error);
        assert_eq!(resp.message, "Failed to update record");
        assert_eq!(resp.result.as_deref(), Some("InvalidChangeBatch: bad zone"));
        assert_eq!(resp.hostname, None);
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn missing_hostname_is_passed_through() {
        let provider = FakeProvider::accepting("ok");
        let mut req = request("203.0.113.7", "", "abc123");
        req.hostname = None;

        let resp = handler(provider.clone()).handle(&req).await;

        assert_eq!(resp.status, Status::Success);
        assert_eq!(provider.calls()[0].name, "");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let provider = FakeProvider::stalling(Duration::from_secs(60));
        let resp = handler(provider.clone())
            .with_timeout(Duration::from_secs(5))
            .handle(&request("203.0.113.7", "home.example.com", "abc123"))
            .await;

        assert_eq!(resp.status, Status::Error);
        assert_eq!(resp.message, "Failed to update record");
        assert!(resp.result.unwrap().contains("timed out"));
        assert_eq!(provider.calls().len(), 1);
    }

    #[test]
    fn token_comparison_is_exact() {
        assert!(tokens_match("abc123", "abc123"));
        assert!(!tokens_match("abc123", "ABC123"));
        assert!(!tokens_match("abc12", "abc123"));
        assert!(!tokens_match("", "abc123"));
    }
}
