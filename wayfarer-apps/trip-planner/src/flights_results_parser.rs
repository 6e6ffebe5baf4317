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

//! # Flights Results Parser
//!
//! Side-effect free parsing of the flight-search provider's JSON response.
//! The envelope is strict: a body that is not JSON, or whose `best_flights`
//! is not a list of offers, is a [`ProviderError::Schema`]. Fields inside an
//! offer are optional because the provider omits them freely.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::ProviderError;
use crate::flights_query_builder::FlightSearchParams;

/// Provider message for an empty result page. Not a failure for us.
const NO_RESULTS_MARKER: &str = "returned any results";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirportStop {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `YYYY-MM-DD HH:MM`, local to the airport
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightLeg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_airport: Option<AirportStop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_airport: Option<AirportStop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airplane: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airline_logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layover {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overnight: Option<bool>,
}

/// One priced itinerary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    #[serde(default)]
    pub flights: Vec<FlightLeg>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layovers: Vec<Layover>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u32>,
    /// Missing, null, or unparseable prices all read as `None`
    #[serde(
        default,
        deserialize_with = "lenient_price",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub trip_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airline_logo: Option<String>,
    /// Continuation token for the booking lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_token: Option<String>,
    /// Only present once resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_token: Option<String>,
}

fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let price = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };
    Ok(price.filter(|p| p.is_finite()))
}

impl FlightOffer {
    pub const UNKNOWN_AIRLINE: &'static str = "Unknown Airline";

    /// Airline operating the first leg.
    pub fn airline(&self) -> &str {
        self.flights
            .first()
            .and_then(|leg| leg.airline.as_deref())
            .unwrap_or(Self::UNKNOWN_AIRLINE)
    }

    pub fn departure(&self) -> Option<&AirportStop> {
        self.flights.first()?.departure_airport.as_ref()
    }

    pub fn arrival(&self) -> Option<&AirportStop> {
        self.flights.last()?.arrival_airport.as_ref()
    }

    pub fn stops(&self) -> usize {
        self.flights.len().saturating_sub(1)
    }

    pub fn same_price(&self, other: &FlightOffer) -> bool {
        match (self.price, other.price) {
            (Some(a), Some(b)) => (a - b).abs() < 0.005,
            (None, None) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchMetadata {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// The provider's raw result, typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightSearchResponse {
    #[serde(default)]
    pub best_flights: Option<Vec<FlightOffer>>,
    #[serde(default)]
    pub other_flights: Option<Vec<FlightOffer>>,
    #[serde(default)]
    pub search_metadata: Option<SearchMetadata>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FlightSearchResponse {
    pub fn from_json(body: &str) -> Result<Self, ProviderError> {
        let response: Self = serde_json::from_str(body).map_err(ProviderError::Schema)?;
        match &response.error {
            Some(msg) if msg.contains(NO_RESULTS_MARKER) => {
                tracing::debug!("Provider returned an empty result page: {}", msg);
                Ok(response)
            }
            Some(msg) => Err(ProviderError::Api(msg.clone())),
            None => Ok(response),
        }
    }

    pub fn best_flights(&self) -> &[FlightOffer] {
        self.best_flights.as_deref().unwrap_or_default()
    }
}

/// Raw result plus the parameters that produced it.
#[derive(Debug, Clone)]
pub struct FlightSearchResult {
    pub search_params: FlightSearchParams,
    pub response: FlightSearchResponse,
    pub raw_response: String,
}

impl FlightSearchResult {
    pub fn from_json(body: &str, search_params: FlightSearchParams) -> Result<Self, ProviderError> {
        let response = FlightSearchResponse::from_json(body)?;
        Ok(Self {
            search_params,
            response,
            raw_response: body.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.response.best_flights().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_parts(self) -> (FlightSearchResponse, FlightSearchParams) {
        (self.response, self.search_params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "search_metadata": {"id": "abc", "status": "Success"},
        "best_flights": [{
            "flights": [
                {
                    "departure_airport": {"name": "Chhatrapati Shivaji", "id": "BOM", "time": "2026-03-06 06:20"},
                    "arrival_airport": {"name": "Ahmedabad", "id": "AMD", "time": "2026-03-06 07:35"},
                    "duration": 75, "airline": "IndiGo", "flight_number": "6E 123", "travel_class": "Economy"
                },
                {
                    "departure_airport": {"id": "AMD", "time": "2026-03-06 09:00"},
                    "arrival_airport": {"id": "DEL", "time": "2026-03-06 10:40"},
                    "duration": 100, "airline": "Air India"
                }
            ],
            "layovers": [{"duration": 85, "name": "Ahmedabad", "id": "AMD"}],
            "total_duration": 260,
            "price": 5120,
            "type": "Round trip",
            "airline_logo": "https://example.test/6E.png",
            "departure_token": "tok-1"
        }]
    }"#;

    #[test]
    fn test_parse_full_offer() {
        let response = FlightSearchResponse::from_json(SAMPLE).unwrap();
        let offer = &response.best_flights()[0];
        assert_eq!(offer.price, Some(5120.0));
        assert_eq!(offer.total_duration, Some(260));
        assert_eq!(offer.airline(), "IndiGo");
        assert_eq!(offer.stops(), 1);
        assert_eq!(offer.departure().unwrap().time.as_deref(), Some("2026-03-06 06:20"));
        assert_eq!(offer.arrival().unwrap().id.as_deref(), Some("DEL"));
        assert_eq!(offer.layovers[0].duration, Some(85));
        assert_eq!(offer.departure_token.as_deref(), Some("tok-1"));
        assert!(offer.booking_token.is_none());
    }

    #[test]
    fn test_lenient_price() {
        let response = FlightSearchResponse::from_json(
            r#"{"best_flights": [{"price": "1,250"}, {"price": "call us"}, {"price": null}, {}, {"price": [1]}]}"#,
        )
        .unwrap();
        let prices: Vec<_> = response.best_flights().iter().map(|o| o.price).collect();
        assert_eq!(prices, vec![Some(1250.0), None, None, None, None]);
        assert_eq!(response.best_flights()[3].airline(), FlightOffer::UNKNOWN_AIRLINE);
    }

    #[test]
    fn test_missing_best_flights_is_empty() {
        let response = FlightSearchResponse::from_json(r#"{"other_flights": []}"#).unwrap();
        assert!(response.best_flights.is_none());
        assert!(response.best_flights().is_empty());
    }

    #[test]
    fn test_envelope_errors() {
        assert!(matches!(
            FlightSearchResponse::from_json("<html>"),
            Err(ProviderError::Schema(_))
        ));
        assert!(matches!(
            FlightSearchResponse::from_json(r#"{"best_flights": {"price": 1}}"#),
            Err(ProviderError::Schema(_))
        ));
        assert!(matches!(
            FlightSearchResponse::from_json(r#"{"error": "Invalid API key."}"#),
            Err(ProviderError::Api(_))
        ));
        let empty = FlightSearchResponse::from_json(
            r#"{"error": "Google Flights hasn't returned any results for this query."}"#,
        )
        .unwrap();
        assert!(empty.best_flights().is_empty());
    }

    #[test]
    fn test_serialized_offer_omits_absent_fields() {
        let offer = FlightOffer {
            price: Some(80.0),
            ..Default::default()
        };
        let json = serde_json::to_string(&offer).unwrap();
        assert_eq!(json, r#"{"flights":[],"price":80.0}"#);
    }
}
