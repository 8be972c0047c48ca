//! Billbee commerce API client

use crate::api::types::OrdersResponse;
use crate::api::{FetchOutcome, OrderApi};
use crate::config::ApiCredentials;
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use tracing::error;

const BASE_URL: &str = "https://api.billbee.io/api/v1";

/// Maximum page size accepted by the orders endpoint
const PAGE_SIZE: u32 = 250;

/// HTTP client for the Billbee REST API
pub struct BillbeeApi {
    client: Client,
    base_url: String,
    credentials: ApiCredentials,
}

impl BillbeeApi {
    /// Create a client against the production endpoint.
    pub fn new(credentials: ApiCredentials) -> Self {
        Self::with_base_url(credentials, BASE_URL)
    }

    /// Create a client against a custom endpoint (tests, staging).
    pub fn with_base_url(credentials: ApiCredentials, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            credentials,
        }
    }

    async fn fetch(&self, start: NaiveDate, end: NaiveDate) -> Result<OrdersResponse> {
        let response = self
            .client
            .get(format!("{}/orders", self.base_url))
            .header("X-Billbee-Api-Key", &self.credentials.api_key)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .query(&[
                ("minOrderDate", start.to_string()),
                ("maxOrderDate", end.to_string()),
                ("pageSize", PAGE_SIZE.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

#[async_trait]
impl OrderApi for BillbeeApi {
    async fn get_orders(&self, start: NaiveDate, end: NaiveDate) -> FetchOutcome {
        match self.fetch(start, end).await {
            Ok(response) => FetchOutcome::Fetched(response.data),
            Err(e) => {
                error!("Billbee order query failed for {} to {}: {}", start, end, e);
                FetchOutcome::Unavailable
            }
        }
    }
}
