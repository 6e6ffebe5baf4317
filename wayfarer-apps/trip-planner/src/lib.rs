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

// Library for wayfarer-trip-planner
// Cheapest flights, booking links and AI-written travel narratives

mod booking_links;
mod config;
mod errors;
mod flight_cards;
mod flights_query_builder;
mod flights_ranker;
mod flights_results_parser;
mod flights_search;
mod narrative_prompts;
mod narratives;
mod outcome;
mod pipeline;
mod text_generation;
mod trip_request;

// Re-export the request side
pub use config::PlannerConfig;
pub use trip_request::{
    BudgetTier, DEFAULT_ACTIVITIES, DEFAULT_CURRENCY, DEFAULT_LOCALE, FlightClass, HotelRating,
    MAX_TRIP_DAYS, MIN_TRIP_DAYS, TravelTheme, TripRequest, TripRequestBuilder, ValidationWarning,
};

// Re-export flights
pub use flights_query_builder::{FLIGHTS_ENGINE, FlightSearchParams};
pub use flights_ranker::{RankedOfferSet, TOP_N, rank, rank_offers};
pub use flights_results_parser::{
    AirportStop, FlightLeg, FlightOffer, FlightSearchResponse, FlightSearchResult, Layover,
    SearchMetadata,
};
pub use flights_search::{FlightProvider, SerpApiFlightsClient};

// Re-export booking links and narratives
pub use booking_links::{BookingLink, BookingLinkResolver};
pub use narrative_prompts::{AgentProfile, NarrativeStep};
pub use narratives::{Narrative, NarrativeResult, NarrativeSource, TripNarrativeGenerator};
pub use text_generation::{GeminiClient, TextGenerator};

// Re-export the pipeline and its results
pub use errors::{BookingResolutionError, GenerationError, PlannerError, ProviderError};
pub use flight_cards::{FlightCard, format_datetime};
pub use outcome::Outcome;
pub use pipeline::{PipelineStage, PlanWarning, TripPlan, TripPlanner};
