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

//! # Planner configuration
//!
//! Built once at startup and handed by reference to the provider clients.

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_FLIGHTS_BASE_URL: &str = "https://serpapi.com";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_BOOKING_BASE_URL: &str = "https://www.google.com/travel/flights";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

#[derive(Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// SerpApi key for the Google Flights engine
    #[serde(default)]
    pub serpapi_key: String,

    /// Google AI Studio key for Gemini
    #[serde(default)]
    pub gemini_api_key: String,

    #[serde(default = "default_flights_base_url")]
    pub flights_base_url: String,

    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,

    /// Booking tokens are appended as `?tfs=<token>` to this URL
    #[serde(default = "default_booking_base_url")]
    pub booking_base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout; `None` keeps the HTTP client default
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default = "default_qps")]
    pub queries_per_second: u32,

    #[serde(default)]
    pub max_retries: u32,
}

fn default_flights_base_url() -> String {
    DEFAULT_FLIGHTS_BASE_URL.to_string()
}

fn default_gemini_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

fn default_booking_base_url() -> String {
    DEFAULT_BOOKING_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_qps() -> u32 {
    2
}

impl PlannerConfig {
    pub fn new(serpapi_key: impl Into<String>, gemini_api_key: impl Into<String>) -> Self {
        Self {
            serpapi_key: serpapi_key.into(),
            gemini_api_key: gemini_api_key.into(),
            flights_base_url: default_flights_base_url(),
            gemini_base_url: default_gemini_base_url(),
            booking_base_url: default_booking_base_url(),
            model: default_model(),
            timeout_secs: None,
            queries_per_second: default_qps(),
            max_retries: 0,
        }
    }

    /// Keys may be left out of the file and filled in by the caller; call
    /// [`Self::validate`] once they are.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.serpapi_key.trim().is_empty(),
            "Flight search API key is required"
        );
        ensure!(
            !self.gemini_api_key.trim().is_empty(),
            "Text generation API key is required"
        );
        ensure!(!self.model.trim().is_empty(), "Model identifier is required");
        ensure!(
            self.queries_per_second > 0,
            "queries_per_second must be at least 1"
        );
        for (name, url) in [
            ("flights_base_url", &self.flights_base_url),
            ("gemini_base_url", &self.gemini_base_url),
            ("booking_base_url", &self.booking_base_url),
        ] {
            ensure!(
                url.starts_with("http://") || url.starts_with("https://"),
                "{} must be an http(s) URL, got '{}'",
                name,
                url
            );
        }
        Ok(())
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

impl std::fmt::Debug for PlannerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannerConfig")
            .field("serpapi_key", &redact(&self.serpapi_key))
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("flights_base_url", &self.flights_base_url)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("booking_base_url", &self.booking_base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("queries_per_second", &self.queries_per_second)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}
