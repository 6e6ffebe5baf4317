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

//! # Flights Ranker
//!
//! Picks the cheapest offers out of a provider response.

use serde::Serialize;
use std::cmp::Ordering;

use crate::flights_results_parser::{FlightOffer, FlightSearchResponse};

/// How many offers survive ranking.
pub const TOP_N: usize = 3;

/// Up to [`TOP_N`] offers, cheapest first. Equal prices keep provider order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RankedOfferSet {
    offers: Vec<FlightOffer>,
}

impl RankedOfferSet {
    pub fn offers(&self) -> &[FlightOffer] {
        &self.offers
    }

    pub fn offers_mut(&mut self) -> &mut [FlightOffer] {
        &mut self.offers
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FlightOffer> {
        self.offers.iter()
    }

    pub fn cheapest(&self) -> Option<&FlightOffer> {
        self.offers.first()
    }

    /// Compact JSON for embedding into prompts. Empty sets render as `[]`.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(&self.offers).unwrap_or_else(|_| "[]".to_string())
    }
}

impl IntoIterator for RankedOfferSet {
    type Item = FlightOffer;
    type IntoIter = std::vec::IntoIter<FlightOffer>;

    fn into_iter(self) -> Self::IntoIter {
        self.offers.into_iter()
    }
}

/// Missing prices compare as positive infinity.
fn price_order(a: &FlightOffer, b: &FlightOffer) -> Ordering {
    let a = a.price.unwrap_or(f64::INFINITY);
    let b = b.price.unwrap_or(f64::INFINITY);
    a.total_cmp(&b)
}

pub fn rank_offers(offers: &[FlightOffer], top_n: usize) -> RankedOfferSet {
    let mut sorted: Vec<FlightOffer> = offers.to_vec();
    // `sort_by` is stable
    sorted.sort_by(price_order);
    sorted.truncate(top_n);
    RankedOfferSet { offers: sorted }
}

/// Rank the `best_flights` of a response; absent means empty.
pub fn rank(response: &FlightSearchResponse) -> RankedOfferSet {
    let ranked = rank_offers(response.best_flights(), TOP_N);
    tracing::debug!(
        "Ranked {} of {} offer(s), cheapest: {:?}",
        ranked.len(),
        response.best_flights().len(),
        ranked.cheapest().and_then(|o| o.price)
    );
    ranked
}
