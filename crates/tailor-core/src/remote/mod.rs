//! HTTP adapter for the remote customization listing API.
//!
//! `GET {endpoint}/customizations` returns one `ListingPage` per call. The
//! scope token and continuation token travel as query parameters. Pagination
//! itself is driven by the coordinator; this client fetches exactly one page.

use crate::config::types::ServiceConfig;
use crate::core_types::ListingPage;
use crate::errors::TailorError;
use crate::services::RemoteListingService;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub struct HttpListingClient {
    pub endpoint_url: String,
    client: Client,
    auth_token: Option<String>,
    page_size: Option<u32>,
}

impl HttpListingClient {
    pub fn new(endpoint_url: String) -> Self {
        Self {
            endpoint_url,
            client: Client::new(),
            auth_token: None,
            page_size: None,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, TailorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TailorError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint_url: config.endpoint.trim_end_matches('/').to_string(),
            client,
            auth_token: config.auth_token.clone(),
            page_size: config.page_size,
        })
    }
}

#[async_trait]
impl RemoteListingService for HttpListingClient {
    async fn list_page(
        &self,
        scope_token: Option<&str>,
        next_token: Option<&str>,
    ) -> Result<ListingPage, TailorError> {
        let request_url = format!("{}/customizations", self.endpoint_url);

        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(scope) = scope_token {
            query.push(("profileArn", scope.to_string()));
        }
        if let Some(token) = next_token {
            query.push(("nextToken", token.to_string()));
        }
        if let Some(size) = self.page_size {
            query.push(("maxResults", size.to_string()));
        }

        log::debug!(
            "HttpListingClient requesting {} (scope: {:?}, next_token: {:?})",
            request_url,
            scope_token,
            next_token
        );

        let mut request = self.client.get(&request_url).query(&query);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            let err_msg = format!("Listing request to {} failed: {}", request_url, e);
            log::error!("{}", err_msg);
            TailorError::TransportError(err_msg)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| {
                "Unknown error while reading error response body".to_string()
            });
            let err_msg = format!(
                "Listing request failed with status {}: {}",
                status, error_text
            );
            log::error!("{}", err_msg);
            return Err(TailorError::TransportError(err_msg));
        }

        match response.json::<ListingPage>().await {
            Ok(page) => {
                log::debug!(
                    "HttpListingClient received {} customizations (more: {})",
                    page.customizations.len(),
                    page.next_token.is_some()
                );
                Ok(page)
            }
            Err(e) => {
                let err_msg = format!("Failed to parse listing response JSON: {}", e);
                log::error!("{}", err_msg);
                Err(TailorError::TransportError(err_msg))
            }
        }
    }
}
