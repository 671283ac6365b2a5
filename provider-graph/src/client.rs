//! Microsoft Graph API client
//!
//! Bearer-authorized calls against the Graph v1.0 endpoints used by the
//! chat assistant.

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bytes::Bytes;
use core_async::time::{sleep, Duration};
use core_auth::AccessTokenSource;
use core_runtime::config::GraphSettings;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{GraphError, Result};
use crate::types::{SearchRequest, SearchResponse, SiteInfo, UserProfile};

/// Timeout for JSON API calls
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for binary downloads
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Microsoft Graph client
///
/// A fresh access token is requested from the token source for every call,
/// so a session that expires mid-conversation surfaces as
/// [`GraphError::Auth`] on the next request.
///
/// # Example
///
/// ```ignore
/// use provider_graph::GraphClient;
///
/// let graph = GraphClient::new(http_client, token_source, &config.graph);
/// let hits = graph.search("quarterly budget").await?;
/// ```
#[derive(Clone)]
pub struct GraphClient {
    http_client: Arc<dyn HttpClient>,
    tokens: Arc<dyn AccessTokenSource>,
    endpoint: String,
    retry: RetryPolicy,
}

impl GraphClient {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        tokens: Arc<dyn AccessTokenSource>,
        settings: &GraphSettings,
    ) -> Self {
        Self {
            http_client,
            tokens,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    /// Search SharePoint content and return the hit resources, flattened
    /// across all hit containers.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<serde_json::Value>> {
        let request = HttpRequest::new(HttpMethod::Post, self.url("/search/query"))
            .json(&SearchRequest::for_query(query))?
            .timeout(API_TIMEOUT);

        let response = self.expect_success(self.send(request).await?)?;
        let parsed: SearchResponse = serde_json::from_slice(&response.body).map_err(|e| {
            GraphError::ParseError(format!("Failed to parse search response: {}", e))
        })?;

        let resources = parsed.into_resources();
        info!(hits = resources.len(), "Search completed");
        Ok(resources)
    }

    /// Download a drive item's content as text.
    #[instrument(skip(self))]
    pub async fn document_content(&self, drive_id: &str, item_id: &str) -> Result<String> {
        let url = self.url(&format!(
            "/drives/{}/items/{}/content",
            urlencoding::encode(drive_id),
            urlencoding::encode(item_id)
        ));
        let request = HttpRequest::new(HttpMethod::Get, url).timeout(DOWNLOAD_TIMEOUT);

        let response = self.expect_success(self.send(request).await?)?;
        debug!(bytes = response.body.len(), "Document content downloaded");
        Ok(String::from_utf8_lossy(&response.body).into_owned())
    }

    #[instrument(skip(self))]
    pub async fn site(&self, site_id: &str) -> Result<SiteInfo> {
        let url = self.url(&format!("/sites/{}", urlencoding::encode(site_id)));
        let request = HttpRequest::new(HttpMethod::Get, url).timeout(API_TIMEOUT);

        let response = self.expect_success(self.send(request).await?)?;
        serde_json::from_slice(&response.body)
            .map_err(|e| GraphError::ParseError(format!("Failed to parse site: {}", e)))
    }

    /// Connectivity check: succeeds when the token is accepted by Graph.
    #[instrument(skip(self))]
    pub async fn fetch_me(&self) -> Result<UserProfile> {
        let request = HttpRequest::new(HttpMethod::Get, self.url("/me")).timeout(API_TIMEOUT);

        let response = self.expect_success(self.send(request).await?)?;
        serde_json::from_slice(&response.body)
            .map_err(|e| GraphError::ParseError(format!("Failed to parse profile: {}", e)))
    }

    /// Profile photo bytes, or `None` when the user has no photo.
    #[instrument(skip(self))]
    pub async fn user_photo(&self) -> Result<Option<Bytes>> {
        let request = HttpRequest::new(HttpMethod::Get, self.url("/me/photo/$value"))
            .timeout(DOWNLOAD_TIMEOUT);

        let response = self.send(request).await?;
        if response.is_not_found() {
            debug!("User has no profile photo");
            return Ok(None);
        }

        let response = self.expect_success(response)?;
        Ok(Some(response.body))
    }

    /// Authorize and execute a request, retrying throttling and transient
    /// server errors. The final response is returned whatever its status.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let token = self.tokens.access_token().await?;
        let request = request
            .bearer_token(token)
            .header("Accept", "application/json");

        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.http_client.execute(request.clone()).await {
                Ok(response) if is_retryable(response.status) && attempt < max_attempts => {
                    let delay = self.retry_delay(&response, attempt);
                    warn!(
                        status = response.status,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Graph request failed, retrying"
                    );
                    sleep(delay).await;
                }
                Ok(response) => return Ok(response),
                Err(e) if attempt < max_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(error = %e, attempt, "Graph request failed, retrying");
                    sleep(delay).await;
                }
                Err(e) => {
                    warn!(error = %e, attempts = attempt, "Graph request failed");
                    return Err(e.into());
                }
            }
        }
    }

    fn expect_success(&self, response: HttpResponse) -> Result<HttpResponse> {
        if response.is_success() {
            return Ok(response);
        }

        if response.status == 429 {
            return Err(GraphError::Throttled {
                retry_after_seconds: retry_after(&response).unwrap_or(0),
            });
        }

        warn!(status = response.status, "Graph request rejected");
        Err(GraphError::ApiError {
            status_code: response.status,
            message: String::from_utf8_lossy(&response.body).into_owned(),
        })
    }

    /// Honor `Retry-After` on 429, capped by the policy's max delay.
    fn retry_delay(&self, response: &HttpResponse, attempt: u32) -> Duration {
        match retry_after(response) {
            Some(seconds) if response.status == 429 => {
                Duration::from_secs(seconds).min(self.retry.max_delay)
            }
            _ => self.backoff(attempt),
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let delay = if self.retry.use_exponential_backoff {
            self.retry
                .base_delay
                .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
        } else {
            self.retry.base_delay
        };
        delay.min(self.retry.max_delay)
    }
}

fn is_retryable(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

fn retry_after(response: &HttpResponse) -> Option<u64> {
    response.header("Retry-After")?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use core_auth::AuthError;
    use mockall::mock;
    use mockall::Sequence;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    struct StaticToken(std::result::Result<String, fn() -> AuthError>);

    #[async_trait]
    impl AccessTokenSource for StaticToken {
        async fn access_token(&self) -> core_auth::Result<String> {
            match &self.0 {
                Ok(token) => Ok(token.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn graph(http: MockHttpClient) -> GraphClient {
        GraphClient::new(
            Arc::new(http),
            Arc::new(StaticToken(Ok("test_token".to_string()))),
            &GraphSettings::default(),
        )
    }

    fn json(status: u16, body: serde_json::Value) -> HttpResponse {
        HttpResponse::new(status, body.to_string())
    }

    #[tokio::test]
    async fn test_search_posts_query_and_flattens_hits() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.method, HttpMethod::Post);
            assert_eq!(req.url, "https://graph.microsoft.com/v1.0/search/query");
            assert_eq!(
                req.headers.get("Authorization").map(String::as_str),
                Some("Bearer test_token")
            );
            let body: serde_json::Value =
                serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
            assert_eq!(body["requests"][0]["query"]["queryString"], "budget");

            Ok(json(
                200,
                serde_json::json!({
                    "value": [{ "hitsContainers": [{ "hits": [
                        { "resource": { "@odata.type": "#microsoft.graph.driveItem", "name": "Budget.docx" } },
                        { "resource": { "@odata.type": "#microsoft.graph.site", "id": "site-1" } }
                    ]}]}]
                }),
            ))
        });

        let hits = graph(mock_http).search("budget").await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0]["name"], "Budget.docx");
        assert_eq!(hits[1]["id"], "site-1");
    }

    #[tokio::test]
    async fn test_document_content_is_text() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(
                req.url,
                "https://graph.microsoft.com/v1.0/drives/b%21drive/items/item%201/content"
            );
            Ok(HttpResponse::new(200, "Quarterly numbers"))
        });

        let content = graph(mock_http)
            .document_content("b!drive", "item 1")
            .await
            .unwrap();
        assert_eq!(content, "Quarterly numbers");
    }

    #[tokio::test]
    async fn test_site_metadata() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.ends_with("/sites/contoso.sharepoint.com%2Csite-1"));
            Ok(json(
                200,
                serde_json::json!({
                    "id": "contoso.sharepoint.com,site-1",
                    "displayName": "Finance",
                    "description": "Finance team site"
                }),
            ))
        });

        let site = graph(mock_http)
            .site("contoso.sharepoint.com,site-1")
            .await
            .unwrap();
        assert_eq!(site.display_name.as_deref(), Some("Finance"));
        assert_eq!(site.description.as_deref(), Some("Finance team site"));
    }

    #[tokio::test]
    async fn test_fetch_me() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.ends_with("/me"));
            Ok(json(
                200,
                serde_json::json!({ "id": "oid-ada", "displayName": "Ada Lovelace" }),
            ))
        });

        let profile = graph(mock_http).fetch_me().await.unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("Ada Lovelace"));
    }

    #[tokio::test]
    async fn test_missing_photo_is_none() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(404, "ImageNotFound")));

        assert_eq!(graph(mock_http).user_photo().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_photo_bytes() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.ends_with("/me/photo/$value"));
            Ok(HttpResponse::new(200, vec![0xFF, 0xD8, 0xFF]))
        });

        let photo = graph(mock_http).user_photo().await.unwrap().unwrap();
        assert_eq!(&photo[..], &[0xFF, 0xD8, 0xFF]);
    }

    #[tokio::test]
    async fn test_token_failure_skips_request() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(0);

        let graph = GraphClient::new(
            Arc::new(mock_http),
            Arc::new(StaticToken(Err(|| {
                AuthError::TokenAcquisition("interaction_required".into())
            }))),
            &GraphSettings::default(),
        );

        let err = graph.fetch_me().await.unwrap_err();
        assert!(err.is_token_failure());
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_are_retried() {
        let mut seq = Sequence::new();
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(HttpResponse::new(503, "busy")));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(BridgeError::OperationFailed("connection reset".into())));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(json(200, serde_json::json!({ "id": "oid-ada" }))));

        let profile = graph(mock_http).fetch_me().await.unwrap();
        assert_eq!(profile.id, "oid-ada");
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_throttling() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(3).returning(|_| {
            let mut response = HttpResponse::new(429, "");
            response
                .headers
                .insert("Retry-After".to_string(), "7".to_string());
            Ok(response)
        });

        let err = graph(mock_http).search("anything").await.unwrap_err();
        assert!(matches!(
            err,
            GraphError::Throttled {
                retry_after_seconds: 7
            }
        ));
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(403, "accessDenied")));

        let err = graph(mock_http).site("site-1").await.unwrap_err();
        assert!(matches!(
            err,
            GraphError::ApiError {
                status_code: 403,
                ..
            }
        ));
        assert!(!err.is_token_failure());
    }
}
