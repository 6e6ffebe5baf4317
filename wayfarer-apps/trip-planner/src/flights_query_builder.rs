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

//! # Flights Query Builder
//!
//! Side-effect free construction of the flight-search provider request.
//! The resulting [`FlightSearchParams`] are echoed back to callers so the same
//! request can be replayed with a continuation token.

use anyhow::{Result, ensure};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::TripRequest;

pub const FLIGHTS_ENGINE: &str = "google_flights";

/// The exact parameter set sent to the provider, minus the API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightSearchParams {
    pub engine: String,
    pub departure_id: String,
    pub arrival_id: String,
    pub outbound_date: String,
    pub return_date: String,
    pub currency: String,
    pub hl: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_token: Option<String>,
}

impl FlightSearchParams {
    pub fn new(
        origin: &str,
        destination: &str,
        outbound_date: NaiveDate,
        return_date: NaiveDate,
        currency: &str,
        locale: &str,
    ) -> Result<Self> {
        let params = Self {
            engine: FLIGHTS_ENGINE.to_string(),
            departure_id: origin.to_string(),
            arrival_id: destination.to_string(),
            outbound_date: outbound_date.format("%Y-%m-%d").to_string(),
            return_date: return_date.format("%Y-%m-%d").to_string(),
            currency: currency.to_string(),
            hl: locale.to_string(),
            departure_token: None,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn from_trip(trip: &TripRequest) -> Result<Self> {
        Self::new(
            &trip.origin,
            &trip.destination,
            trip.departure_date,
            trip.return_date,
            &trip.currency,
            &trip.locale,
        )
    }

    /// Same request, continued from one offer of a previous response.
    pub fn with_departure_token(&self, token: &str) -> Self {
        Self {
            departure_token: Some(token.to_string()),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.departure_id.is_empty(), "Origin code is required");
        ensure!(!self.arrival_id.is_empty(), "Destination code is required");
        ensure!(!self.currency.is_empty(), "Currency is required");
        ensure!(!self.hl.is_empty(), "Locale is required");
        Ok(())
    }

    /// Ordered query pairs, without the credential.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![
            ("engine", self.engine.as_str()),
            ("departure_id", self.departure_id.as_str()),
            ("arrival_id", self.arrival_id.as_str()),
            ("outbound_date", self.outbound_date.as_str()),
            ("return_date", self.return_date.as_str()),
            ("currency", self.currency.as_str()),
            ("hl", self.hl.as_str()),
        ];
        if let Some(token) = &self.departure_token {
            pairs.push(("departure_token", token.as_str()));
        }
        pairs
    }

    pub fn to_query_string(&self) -> String {
        encode_pairs(&self.query_pairs())
    }

    /// Full request URL. The key is appended last so logs can cut it off.
    pub fn get_search_url(&self, base_url: &str, api_key: &str) -> String {
        format!(
            "{}/search?{}&api_key={}",
            base_url.trim_end_matches('/'),
            self.to_query_string(),
            urlencoding::encode(api_key)
        )
    }
}

fn encode_pairs(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
