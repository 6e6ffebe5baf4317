//!  Wayfarer Trip Planner
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Flight Search Client
//!
//! Effectful (network) operations against the SerpApi Google Flights engine.

use anyhow::Context;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wayfarer_query_queues::QueryQueue;

use crate::PlannerConfig;
use crate::errors::ProviderError;
use crate::flights_query_builder::FlightSearchParams;
use crate::flights_results_parser::FlightSearchResult;

/// A flight-search provider.
///
/// Used both for the initial search and for the booking lookup, which is the
/// same search continued with a `departure_token`.
pub trait FlightProvider: Send + Sync {
    fn search_flights(
        &self,
        params: &FlightSearchParams,
    ) -> impl Future<Output = Result<FlightSearchResult, ProviderError>> + Send;
}

#[derive(Clone)]
pub struct SerpApiFlightsClient {
    client: Arc<wreq::Client>,
    query_queue: QueryQueue,
    base_url: String,
    api_key: String,
}

impl SerpApiFlightsClient {
    pub fn new(config: &PlannerConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let mut builder = wreq::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder
                .timeout(Duration::from_secs(secs))
                .connect_timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        let query_queue = QueryQueue::with_qps_limit(config.queries_per_second as u64)
            .with_max_retries(config.max_retries);
        Ok(Self {
            client: Arc::new(client),
            query_queue,
            base_url: config.flights_base_url.trim_end_matches('/').to_string(),
            api_key: config.serpapi_key.clone(),
        })
    }

    pub async fn fetch_raw(&self, params: &FlightSearchParams) -> Result<String, ProviderError> {
        let url = params.get_search_url(&self.base_url, &self.api_key);
        let client_inner = Arc::clone(&self.client);
        tracing::debug!(
            "[fetch_raw] GET {}/search?{}",
            self.base_url,
            params.to_query_string()
        );

        let queue_start = Instant::now();
        let body = self
            .query_queue
            .run(move |attempt| {
                let url = url.clone();
                let http_client = client_inner.clone();
                async move {
                    let http_start = Instant::now();
                    tracing::trace!("[fetch_raw] attempt {}", attempt);
                    let resp = http_client
                        .get(&url)
                        .header("Accept", "application/json")
                        .send()
                        .await
                        .map_err(|e| ProviderError::Transport(e.to_string()))?;
                    let status = resp.status();
                    let body = resp
                        .text()
                        .await
                        .map_err(|e| ProviderError::Transport(e.to_string()))?;
                    tracing::debug!(
                        "[fetch_raw] HTTP {} in {:?}, {} KB",
                        status.as_u16(),
                        http_start.elapsed(),
                        body.len() / 1024
                    );
                    if !status.is_success() {
                        return Err(ProviderError::Http {
                            status: status.as_u16(),
                            body_preview: body.chars().take(500).collect(),
                        });
                    }
                    Ok(body)
                }
            })
            .await?;
        tracing::debug!(
            "[fetch_raw] Query queue + HTTP execution time: {:?}",
            queue_start.elapsed()
        );
        Ok(body)
    }
}

impl FlightProvider for SerpApiFlightsClient {
    async fn search_flights(
        &self,
        params: &FlightSearchParams,
    ) -> Result<FlightSearchResult, ProviderError> {
        let overall_start = Instant::now();
        if let Err(e) = params.validate() {
            return Err(ProviderError::Api(format!("Invalid search parameters: {e}")));
        }

        let body = self.fetch_raw(params).await?;
        match FlightSearchResult::from_json(&body, params.clone()) {
            Ok(result) => {
                tracing::info!(
                    "Flight search {} -> {} returned {} best offer(s) in {:?}",
                    params.departure_id,
                    params.arrival_id,
                    result.len(),
                    overall_start.elapsed()
                );
                Ok(result)
            }
            Err(e) => {
                let preview = body.chars().take(500).collect::<String>();
                tracing::error!("Flight search response rejected: {}", e);
                tracing::debug!("Response preview (first 500 chars):\n{}", preview);
                Err(e)
            }
        }
    }
}
