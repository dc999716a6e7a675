use crate::config::trust::TrustConfig;
use crate::config::upstream::UpstreamConfig;
use crate::lookup::{ClientLookup, LookupError, UserLookup};
use crate::models::{ClientDetails, UserRecord};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Header naming the tenant a directory query is scoped to
pub const TENANT_HEADER: &str = "tenant-id";

/// HTTP client of the user and client directory.
///
/// Every request is marked as an inner-service call so the directory's own
/// trust boundary lets it through.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: Url,
}

impl UpstreamClient {
    pub fn new(upstream: &UpstreamConfig, trust: &TrustConfig) -> Result<Self, LookupError> {
        let base_url = Url::parse(&upstream.url)
            .map_err(|e| LookupError::Config(format!("invalid upstream url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(LookupError::Config(format!(
                "upstream url '{}' cannot be a base",
                upstream.url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(trust.source_header.as_bytes())
                .map_err(|e| LookupError::Config(format!("invalid source header: {e}")))?,
            HeaderValue::from_str(&trust.inner_value)
                .map_err(|e| LookupError::Config(format!("invalid inner value: {e}")))?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(upstream.timeout))
            .connect_timeout(Duration::from_secs(2))
            .default_headers(headers)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()?;

        Ok(Self { client, base_url })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, LookupError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LookupError::Config("upstream url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a JSON resource, mapping 404 to `None`
    async fn fetch<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        tenant: Option<&str>,
    ) -> Result<Option<T>, LookupError> {
        let url = self.url(segments)?;
        debug!("Querying directory at: {}", url);

        let mut request = self.client.get(url);
        if let Some(tenant) = tenant {
            request = request.header(TENANT_HEADER, tenant);
        }
        let response = request.send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(LookupError::Status(status.as_u16())),
        }
    }
}

#[async_trait::async_trait]
impl UserLookup for UpstreamClient {
    async fn lookup_by_username(
        &self,
        tenant: Option<&str>,
        username: &str,
    ) -> Result<Option<UserRecord>, LookupError> {
        self.fetch(&["users", "username", username], tenant).await
    }

    async fn lookup_by_mobile(
        &self,
        tenant: Option<&str>,
        phone: &str,
    ) -> Result<Option<UserRecord>, LookupError> {
        self.fetch(&["users", "mobile", phone], tenant).await
    }
}

#[async_trait::async_trait]
impl ClientLookup for UpstreamClient {
    async fn lookup_by_client_id(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientDetails>, LookupError> {
        self.fetch(&["clients", client_id], None).await
    }
}
