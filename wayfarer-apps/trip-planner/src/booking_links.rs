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

//! # Booking Links
//!
//! Turns an offer's continuation token into a bookable link by replaying the
//! original search with `departure_token` set.
//!
//! The provider's second response is matched back to the offer by rank
//! position. Nothing guarantees that both responses share an order, so the
//! positional entry is cross-checked by price.

use serde::Serialize;
use std::collections::HashSet;

use crate::errors::BookingResolutionError;
use crate::flights_query_builder::FlightSearchParams;
use crate::flights_ranker::RankedOfferSet;
use crate::flights_results_parser::{FlightOffer, FlightSearchResponse};
use crate::flights_search::FlightProvider;
use crate::outcome::Outcome;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookingLink {
    Resolved { url: String, booking_token: String },
    Inert,
}

impl BookingLink {
    pub const PLACEHOLDER: &'static str = "#";

    pub fn for_token(booking_base_url: &str, booking_token: &str) -> Self {
        Self::Resolved {
            url: format!("{}?tfs={}", booking_base_url, booking_token),
            booking_token: booking_token.to_string(),
        }
    }

    pub fn href(&self) -> &str {
        match self {
            Self::Resolved { url, .. } => url,
            Self::Inert => Self::PLACEHOLDER,
        }
    }

    pub fn booking_token(&self) -> Option<&str> {
        match self {
            Self::Resolved { booking_token, .. } => Some(booking_token),
            Self::Inert => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// Token taken from a booking lookup, plus a note when the match is doubtful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PickedToken {
    pub token: String,
    pub note: Option<String>,
}

fn token_at(entries: &[FlightOffer], index: usize) -> Result<String, BookingResolutionError> {
    entries[index]
        .booking_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or(BookingResolutionError::MissingToken { index })
}

/// Pick the booking token for `offer`, ranked at `index`, out of a lookup response.
pub(crate) fn pick_booking_token(
    offer: &FlightOffer,
    response: &FlightSearchResponse,
    index: usize,
) -> Result<PickedToken, BookingResolutionError> {
    let entries = response.best_flights();
    let Some(positional) = entries.get(index) else {
        return Err(BookingResolutionError::MissingEntry {
            index,
            available: entries.len(),
        });
    };

    let same_priced: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.same_price(offer))
        .map(|(i, _)| i)
        .collect();

    if positional.same_price(offer) {
        let note = (same_priced.len() > 1).then(|| {
            format!(
                "booking link for offer #{} is ambiguous: {} lookup entries cost {:?}",
                index + 1,
                same_priced.len(),
                offer.price
            )
        });
        return Ok(PickedToken {
            token: token_at(entries, index)?,
            note,
        });
    }

    if let [other] = same_priced.as_slice() {
        tracing::debug!(
            "Booking lookup reordered: offer at position {} found at position {}",
            index,
            other
        );
        return Ok(PickedToken {
            token: token_at(entries, *other)?,
            note: None,
        });
    }

    Ok(PickedToken {
        token: token_at(entries, index)?,
        note: Some(format!(
            "booking link for offer #{} may not match: lookup price {:?} differs from offer price {:?}",
            index + 1,
            positional.price,
            offer.price
        )),
    })
}

pub struct BookingLinkResolver<'a, P> {
    provider: &'a P,
    booking_base_url: String,
}

impl<'a, P: FlightProvider> BookingLinkResolver<'a, P> {
    pub fn new(provider: &'a P, booking_base_url: &str) -> Self {
        Self {
            provider,
            booking_base_url: booking_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve one ranked offer.
    ///
    /// Offers without a continuation token are `Ok(Inert)` and never touch the
    /// network. Lookup failures degrade to `Fallback(Inert)`.
    pub async fn resolve(
        &self,
        offer: &FlightOffer,
        echoed: &FlightSearchParams,
        index: usize,
    ) -> Outcome<BookingLink> {
        let Some(token) = offer.departure_token.as_deref().filter(|t| !t.is_empty()) else {
            tracing::debug!("Offer #{} has no continuation token", index + 1);
            return Outcome::Ok(BookingLink::Inert);
        };

        match self.lookup(token, echoed, offer, index).await {
            Ok(PickedToken { token, note: None }) => {
                Outcome::Ok(BookingLink::for_token(&self.booking_base_url, &token))
            }
            Ok(PickedToken {
                token,
                note: Some(note),
            }) => {
                tracing::warn!("{}", note);
                Outcome::fallback(BookingLink::for_token(&self.booking_base_url, &token), note)
            }
            Err(e) => {
                tracing::warn!("Booking lookup for offer #{} failed: {}", index + 1, e);
                Outcome::fallback(
                    BookingLink::Inert,
                    format!("Error fetching booking details for offer #{}: {}", index + 1, e),
                )
            }
        }
    }

    /// Resolve every ranked offer, in rank order.
    ///
    /// A booking token already given to an earlier offer is never reused:
    /// the later offer degrades to `Fallback(Inert)`.
    pub async fn resolve_all(
        &self,
        offers: &RankedOfferSet,
        echoed: &FlightSearchParams,
    ) -> Vec<Outcome<BookingLink>> {
        let mut assigned: HashSet<String> = HashSet::new();
        let mut outcomes = Vec::with_capacity(offers.len());
        for (index, offer) in offers.iter().enumerate() {
            let outcome = self.resolve(offer, echoed, index).await;
            let duplicate = match &outcome {
                Outcome::Ok(link) | Outcome::Fallback { value: link, .. } => link
                    .booking_token()
                    .is_some_and(|token| !assigned.insert(token.to_string())),
                Outcome::Fatal(_) => false,
            };
            if duplicate {
                let reason = format!(
                    "booking link for offer #{} is already used by a higher-ranked offer",
                    index + 1
                );
                tracing::warn!("{}", reason);
                outcomes.push(Outcome::fallback(BookingLink::Inert, reason));
            } else {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    async fn lookup(
        &self,
        departure_token: &str,
        echoed: &FlightSearchParams,
        offer: &FlightOffer,
        index: usize,
    ) -> Result<PickedToken, BookingResolutionError> {
        let params = echoed.with_departure_token(departure_token);
        tracing::debug!(
            "Booking lookup for offer #{} ({} char token)",
            index + 1,
            departure_token.len()
        );
        let result = self.provider.search_flights(&params).await?;
        pick_booking_token(offer, &result.response, index)
    }
}
