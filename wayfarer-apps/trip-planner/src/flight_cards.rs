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

//! # Flight Cards
//!
//! Display-ready view of a ranked offer and its booking link.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::booking_links::BookingLink;
use crate::flights_results_parser::FlightOffer;

pub const NOT_AVAILABLE: &str = "N/A";
pub const PRICE_NOT_AVAILABLE: &str = "Not Available";

/// `2026-03-06 18:20` becomes `Mar-06, 2026 | 06:20 PM`; anything else is `N/A`.
pub fn format_datetime(raw: Option<&str>) -> String {
    raw.and_then(|s| NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M").ok())
        .map(|dt| dt.format("%b-%d, %Y | %I:%M %p").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn format_price(price: Option<f64>, currency: &str) -> String {
    match price {
        Some(p) if p.fract() == 0.0 => format!("{} {:.0}", currency, p),
        Some(p) => format!("{} {:.2}", currency, p),
        None => PRICE_NOT_AVAILABLE.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightCard {
    pub airline_logo: Option<String>,
    pub airline: String,
    pub departure: String,
    pub arrival: String,
    pub duration: String,
    pub price: String,
    pub booking_url: String,
}

impl FlightCard {
    pub fn from_offer(offer: &FlightOffer, link: &BookingLink, currency: &str) -> Self {
        Self {
            airline_logo: offer.airline_logo.clone(),
            airline: offer.airline().to_string(),
            departure: format_datetime(offer.departure().and_then(|a| a.time.as_deref())),
            arrival: format_datetime(offer.arrival().and_then(|a| a.time.as_deref())),
            duration: offer
                .total_duration
                .map(|m| format!("{} min", m))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            price: format_price(offer.price, currency),
            booking_url: link.href().to_string(),
        }
    }

    /// Fixed-width plain text block for terminals.
    pub fn render(&self, width: usize) -> String {
        let rule = "─".repeat(width.clamp(20, 80));
        format!(
            "{rule}\n  {}\n  Departure: {}\n  Arrival:   {}\n  Duration:  {}\n  Price:     {}\n  Book:      {}\n{rule}",
            self.airline, self.departure, self.arrival, self.duration, self.price, self.booking_url,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flights_results_parser::{AirportStop, FlightLeg};

    fn stop(time: &str) -> Option<AirportStop> {
        Some(AirportStop {
            time: Some(time.to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_format_datetime() {
        assert_eq!(
            format_datetime(Some("2026-03-06 18:20")),
            "Mar-06, 2026 | 06:20 PM"
        );
        assert_eq!(
            format_datetime(Some("2026-03-06 06:05")),
            "Mar-06, 2026 | 06:05 AM"
        );
        assert_eq!(format_datetime(Some("tomorrow")), "N/A");
        assert_eq!(format_datetime(None), "N/A");
    }

    #[test]
    fn test_card_from_offer() {
        let offer = FlightOffer {
            flights: vec![
                FlightLeg {
                    airline: Some("IndiGo".into()),
                    departure_airport: stop("2026-03-06 06:20"),
                    arrival_airport: stop("2026-03-06 07:35"),
                    ..Default::default()
                },
                FlightLeg {
                    airline: Some("Air India".into()),
                    departure_airport: stop("2026-03-06 09:00"),
                    arrival_airport: stop("2026-03-06 10:40"),
                    ..Default::default()
                },
            ],
            total_duration: Some(260),
            price: Some(5120.0),
            ..Default::default()
        };
        let link = BookingLink::for_token("https://www.google.com/travel/flights", "T");
        let card = FlightCard::from_offer(&offer, &link, "INR");
        assert_eq!(card.airline, "IndiGo");
        assert_eq!(card.departure, "Mar-06, 2026 | 06:20 AM");
        assert_eq!(card.arrival, "Mar-06, 2026 | 10:40 AM");
        assert_eq!(card.duration, "260 min");
        assert_eq!(card.price, "INR 5120");
        assert_eq!(card.booking_url, "https://www.google.com/travel/flights?tfs=T");
    }

    #[test]
    fn test_card_with_missing_fields() {
        let card = FlightCard::from_offer(&FlightOffer::default(), &BookingLink::Inert, "INR");
        assert_eq!(card.airline, "Unknown Airline");
        assert_eq!(card.departure, "N/A");
        assert_eq!(card.duration, "N/A");
        assert_eq!(card.price, "Not Available");
        assert_eq!(card.booking_url, "#");
        assert!(card.render(40).contains("Book:      #"));
    }
}
