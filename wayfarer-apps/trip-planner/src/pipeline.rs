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

//! # Planning Pipeline
//!
//! One run per user action: search, rank, resolve booking links, then the
//! three narratives. Steps are awaited strictly in sequence.
//!
//! ```text
//! Idle → FetchingFlights → Ranking → ResolvingLinks → GeneratingResearch
//!      → GeneratingLodging → GeneratingItinerary → Done
//!
//! FetchingFlights → Failed
//! ```

use serde::Serialize;
use std::fmt;
use std::time::Instant;

use crate::PlannerConfig;
use crate::booking_links::{BookingLink, BookingLinkResolver};
use crate::errors::{PlannerError, ProviderError};
use crate::flight_cards::FlightCard;
use crate::flights_query_builder::FlightSearchParams;
use crate::flights_ranker::{self, RankedOfferSet};
use crate::flights_search::{FlightProvider, SerpApiFlightsClient};
use crate::narrative_prompts::NarrativeStep;
use crate::narratives::{Narrative, NarrativeResult, TripNarrativeGenerator};
use crate::text_generation::{GeminiClient, TextGenerator};
use crate::trip_request::{TripRequest, ValidationWarning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PipelineStage {
    Idle,
    FetchingFlights,
    Ranking,
    ResolvingLinks,
    GeneratingResearch,
    GeneratingLodging,
    GeneratingItinerary,
    Done,
    Failed,
}

impl PipelineStage {
    /// Whether `next` may directly follow `self`.
    pub fn can_transition_to(self, next: PipelineStage) -> bool {
        use PipelineStage::*;
        matches!(
            (self, next),
            (Idle, FetchingFlights)
                | (FetchingFlights, Ranking)
                | (FetchingFlights, Failed)
                | (Ranking, ResolvingLinks)
                | (ResolvingLinks, GeneratingResearch)
                | (GeneratingResearch, GeneratingLodging)
                | (GeneratingLodging, GeneratingItinerary)
                | (GeneratingItinerary, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Progress line shown to users.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Waiting for a trip request",
            Self::FetchingFlights => "✈️ Fetching best flight options...",
            Self::Ranking => "Picking the cheapest offers...",
            Self::ResolvingLinks => "🔗 Resolving booking links...",
            Self::GeneratingResearch => "🔍 Researching best attractions & activities...",
            Self::GeneratingLodging => "🏨 Searching for hotels & restaurants...",
            Self::GeneratingItinerary => "🗺️ Creating your personalized itinerary...",
            Self::Done => "✅ Travel plan ready",
            Self::Failed => "❌ Flight search failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Something the user should know about a finished plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanWarning {
    Validation { warning: ValidationWarning, message: String },
    Booking { offer: usize, reason: String },
    Narrative { step: NarrativeStep, reason: String },
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { message, .. } => f.write_str(message),
            Self::Booking { reason, .. } => f.write_str(reason),
            Self::Narrative { reason, .. } => {
                write!(f, "{}. Using fallback information.", reason)
            }
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct TripPlan {
    pub request: TripRequest,
    pub search_params: FlightSearchParams,
    /// Booking tokens are attached to resolved offers
    pub offers: RankedOfferSet,
    /// One per offer, same order
    pub links: Vec<BookingLink>,
    pub narratives: NarrativeResult,
    pub warnings: Vec<PlanWarning>,
    pub stages: Vec<PipelineStage>,
}

impl TripPlan {
    pub fn flight_cards(&self) -> Vec<FlightCard> {
        self.offers
            .iter()
            .zip(&self.links)
            .map(|(offer, link)| FlightCard::from_offer(offer, link, &self.request.currency))
            .collect()
    }

    pub fn final_stage(&self) -> PipelineStage {
        self.stages.last().copied().unwrap_or(PipelineStage::Idle)
    }
}

struct StageTracker<F> {
    stages: Vec<PipelineStage>,
    on_stage: F,
}

impl<F: FnMut(PipelineStage)> StageTracker<F> {
    fn new(on_stage: F) -> Self {
        Self {
            stages: vec![PipelineStage::Idle],
            on_stage,
        }
    }

    fn enter(&mut self, next: PipelineStage) {
        let current = self.stages.last().copied().unwrap_or(PipelineStage::Idle);
        debug_assert!(
            current.can_transition_to(next),
            "invalid transition {current} -> {next}"
        );
        tracing::info!("[pipeline] {} -> {}", current, next);
        self.stages.push(next);
        (self.on_stage)(next);
    }
}

pub struct TripPlanner<P, G> {
    flights: P,
    generator: G,
    booking_base_url: String,
}

impl TripPlanner<SerpApiFlightsClient, GeminiClient> {
    /// Planner wired to the live SerpApi and Gemini clients.
    pub fn from_config(config: &PlannerConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self::new(
            SerpApiFlightsClient::new(config)?,
            GeminiClient::new(config)?,
            config,
        ))
    }
}

impl<P: FlightProvider, G: TextGenerator> TripPlanner<P, G> {
    pub fn new(flights: P, generator: G, config: &PlannerConfig) -> Self {
        Self {
            flights,
            generator,
            booking_base_url: config.booking_base_url.clone(),
        }
    }

    pub fn flights(&self) -> &P {
        &self.flights
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Flight search and ranking only.
    pub async fn search_flights(
        &self,
        trip: &TripRequest,
    ) -> Result<(RankedOfferSet, FlightSearchParams), PlannerError> {
        let params = FlightSearchParams::from_trip(trip)
            .map_err(|e| ProviderError::Api(format!("Invalid search parameters: {e}")))?;
        let (response, echoed) = self.flights.search_flights(&params).await?.into_parts();
        Ok((flights_ranker::rank(&response), echoed))
    }

    pub async fn plan(&self, trip: &TripRequest) -> Result<TripPlan, PlannerError> {
        self.plan_with_progress(trip, |_| {}).await
    }

    /// Run the whole pipeline, reporting every stage entered to `on_stage`.
    pub async fn plan_with_progress<F>(
        &self,
        trip: &TripRequest,
        on_stage: F,
    ) -> Result<TripPlan, PlannerError>
    where
        F: FnMut(PipelineStage) + Send,
    {
        let run_start = Instant::now();
        let mut tracker = StageTracker::new(on_stage);
        let mut warnings: Vec<PlanWarning> = trip
            .validation_warnings(chrono::Local::now().date_naive())
            .into_iter()
            .map(|warning| {
                tracing::warn!("{}", warning);
                PlanWarning::Validation {
                    message: warning.to_string(),
                    warning,
                }
            })
            .collect();

        tracker.enter(PipelineStage::FetchingFlights);
        let params = match FlightSearchParams::from_trip(trip) {
            Ok(params) => params,
            Err(e) => {
                tracker.enter(PipelineStage::Failed);
                return Err(ProviderError::Api(format!("Invalid search parameters: {e}")).into());
            }
        };
        let result = match self.flights.search_flights(&params).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Flight search failed, aborting run: {}", e);
                tracker.enter(PipelineStage::Failed);
                return Err(e.into());
            }
        };

        tracker.enter(PipelineStage::Ranking);
        let (response, search_params) = result.into_parts();
        let mut offers = flights_ranker::rank(&response);

        tracker.enter(PipelineStage::ResolvingLinks);
        let resolver = BookingLinkResolver::new(&self.flights, &self.booking_base_url);
        let mut links = Vec::with_capacity(offers.len());
        let outcomes = resolver.resolve_all(&offers, &search_params).await;
        for (index, outcome) in outcomes.into_iter().enumerate() {
            let (link, reason) = outcome.into_parts()?;
            if let Some(reason) = reason {
                warnings.push(PlanWarning::Booking {
                    offer: index,
                    reason,
                });
            }
            links.push(link);
        }
        for (offer, link) in offers.offers_mut().iter_mut().zip(&links) {
            if let Some(token) = link.booking_token() {
                offer.booking_token = Some(token.to_string());
            }
        }

        let narrator = TripNarrativeGenerator::new(&self.generator);

        tracker.enter(PipelineStage::GeneratingResearch);
        let research = narrative(
            NarrativeStep::Research,
            narrator.research(trip).await.into_parts()?,
            &mut warnings,
        );

        tracker.enter(PipelineStage::GeneratingLodging);
        let lodging = narrative(
            NarrativeStep::Lodging,
            narrator
                .find_lodging(trip, &research.text)
                .await
                .into_parts()?,
            &mut warnings,
        );

        tracker.enter(PipelineStage::GeneratingItinerary);
        let itinerary = narrative(
            NarrativeStep::Itinerary,
            narrator
                .build_itinerary(trip, &research.text, &lodging.text, &offers)
                .await
                .into_parts()?,
            &mut warnings,
        );

        tracker.enter(PipelineStage::Done);
        tracing::info!(
            "Planned {} -> {} in {:?}: {} offer(s), {} warning(s)",
            trip.origin,
            trip.destination,
            run_start.elapsed(),
            offers.len(),
            warnings.len()
        );

        Ok(TripPlan {
            request: trip.clone(),
            search_params,
            offers,
            links,
            narratives: NarrativeResult {
                research,
                lodging,
                itinerary,
            },
            warnings,
            stages: tracker.stages,
        })
    }
}

fn narrative(
    step: NarrativeStep,
    (text, reason): (String, Option<String>),
    warnings: &mut Vec<PlanWarning>,
) -> Narrative {
    if let Some(reason) = &reason {
        warnings.push(PlanWarning::Narrative {
            step,
            reason: reason.clone(),
        });
    }
    Narrative::from_parts(text, reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        use PipelineStage::*;
        let path = [
            Idle,
            FetchingFlights,
            Ranking,
            ResolvingLinks,
            GeneratingResearch,
            GeneratingLodging,
            GeneratingItinerary,
            Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?}", pair);
        }
        assert!(Done.is_terminal());
    }

    #[test]
    fn test_failed_only_from_fetching_flights() {
        use PipelineStage::*;
        for stage in [
            Idle,
            Ranking,
            ResolvingLinks,
            GeneratingResearch,
            GeneratingLodging,
            GeneratingItinerary,
            Done,
        ] {
            assert!(!stage.can_transition_to(Failed), "{stage}");
        }
        assert!(FetchingFlights.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Ranking));
    }

    #[test]
    fn test_warning_display() {
        let w = PlanWarning::Narrative {
            step: NarrativeStep::Lodging,
            reason: "Error generating hotels & restaurants: boom".into(),
        };
        assert_eq!(
            w.to_string(),
            "Error generating hotels & restaurants: boom. Using fallback information."
        );
    }
}
