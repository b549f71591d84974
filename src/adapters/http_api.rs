//! Platform REST API client.
//!
//! One client implements every store-facing port: the platform service owns
//! inventory, variance alerts and the merged sales ledger, and proxies the
//! vendor POS APIs behind a uniform sales endpoint.

use crate::domain::model::{
    BusinessDayBounds, SaleRecord, StockLevel, VarianceCounts,
};
use crate::domain::ports::{AlertStore, InventoryStore, SalesLedger, SyncClient};
use crate::utils::error::{CellarError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use std::time::Duration;

pub struct HttpApiClient {
    base_url: String,
    client: Client,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn status_error(provider: &str, status: StatusCode, body: String) -> CellarError {
        // 5xx and throttling are worth retrying; other client errors are
        // permanent misconfiguration.
        let retryable = status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
        CellarError::FetchFailed {
            provider: provider.to_string(),
            retryable,
            message: format!("HTTP {}: {}", status, body),
        }
    }
}

#[async_trait]
impl SyncClient for HttpApiClient {
    async fn fetch_sales(
        &self,
        location_id: &str,
        window: &BusinessDayBounds,
        provider_id: &str,
    ) -> Result<Vec<SaleRecord>> {
        let url = self.url(&format!("/locations/{}/sales", location_id));
        let response = self
            .client
            .get(&url)
            .query(&[
                ("provider", provider_id),
                ("from", &window.start.to_rfc3339()),
                ("to", &window.end.to_rfc3339()),
            ])
            .send()
            .await
            .map_err(|e| CellarError::FetchFailed {
                provider: provider_id.to_string(),
                retryable: e.is_timeout() || e.is_connect(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(provider_id, status, body));
        }

        let sales: Vec<SaleRecord> = response.json().await.map_err(|e| CellarError::FetchFailed {
            provider: provider_id.to_string(),
            retryable: false,
            message: format!("malformed sales payload: {}", e),
        })?;
        tracing::debug!(location_id, provider_id, count = sales.len(), "fetched sales");
        Ok(sales)
    }
}

#[async_trait]
impl InventoryStore for HttpApiClient {
    async fn snapshot(&self, location_id: &str) -> Result<Vec<StockLevel>> {
        let url = self.url(&format!("/locations/{}/inventory", location_id));
        let response = self.client.get(&url).send().await?;
        let response = response.error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AlertStore for HttpApiClient {
    async fn variance_counts(&self, location_id: &str) -> Result<VarianceCounts> {
        let url = self.url(&format!("/locations/{}/alerts/variance", location_id));
        let response = self.client.get(&url).send().await?;
        let response = response.error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SalesLedger for HttpApiClient {
    async fn merge_sales(
        &self,
        location_id: &str,
        day: NaiveDate,
        sales: &[SaleRecord],
    ) -> Result<()> {
        let url = self.url(&format!("/locations/{}/sales/{}/merge", location_id, day));
        let response = self
            .client
            .post(&url)
            .json(sales)
            .send()
            .await
            .map_err(|e| CellarError::PersistenceFailed {
                message: format!("merge request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CellarError::PersistenceFailed {
                message: format!("merge rejected with HTTP {}: {}", status, body),
            });
        }
        Ok(())
    }
}
