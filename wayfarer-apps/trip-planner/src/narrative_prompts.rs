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

//! # Narrative Prompts
//!
//! Side-effect free prompt construction for the three narrative agents, and
//! the deterministic fallback texts used when the text-generation service
//! cannot answer.

use chrono::{DateTime, TimeZone};
use std::fmt;

use crate::TripRequest;
use crate::flights_ranker::RankedOfferSet;

/// The three narrative steps, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeStep {
    Research,
    Lodging,
    Itinerary,
}

impl fmt::Display for NarrativeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Research => "research",
            Self::Lodging => "hotels & restaurants",
            Self::Itinerary => "itinerary",
        })
    }
}

/// Persona handed to the text-generation service with every prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    pub name: &'static str,
    pub instructions: &'static [&'static str],
    /// Let the service ground its answer with web search
    pub web_search: bool,
}

pub const RESEARCHER: AgentProfile = AgentProfile {
    name: "Researcher",
    instructions: &[
        "Identify the travel destination specified by the user.",
        "Gather detailed information on the destination, including climate, culture, and safety tips.",
        "Find popular attractions, landmarks, and must-visit places.",
        "Search for activities that match the user's interests and travel style.",
        "Prioritize information from reliable sources and official travel guides.",
        "Provide well-structured summaries with key insights and recommendations.",
    ],
    web_search: true,
};

pub const HOTEL_RESTAURANT_FINDER: AgentProfile = AgentProfile {
    name: "Hotel & Restaurant Finder",
    instructions: &[
        "Identify key locations in the user's travel itinerary.",
        "Search for highly rated hotels near those locations.",
        "Search for top-rated restaurants based on cuisine preferences and proximity.",
        "Prioritize results based on user preferences, ratings, and availability.",
        "Provide direct booking links or reservation options where possible.",
    ],
    web_search: true,
};

pub const PLANNER: AgentProfile = AgentProfile {
    name: "Planner",
    instructions: &[
        "Gather details about the user's travel preferences and budget.",
        "Create a detailed itinerary with scheduled activities and estimated costs.",
        "Ensure the itinerary includes transportation options and travel time estimates.",
        "Optimize the schedule for convenience and enjoyment.",
        "Present the itinerary in a structured format.",
    ],
    web_search: false,
};

impl AgentProfile {
    pub fn for_step(step: NarrativeStep) -> &'static AgentProfile {
        match step {
            NarrativeStep::Research => &RESEARCHER,
            NarrativeStep::Lodging => &HOTEL_RESTAURANT_FINDER,
            NarrativeStep::Itinerary => &PLANNER,
        }
    }

    /// System instruction text, stamped with the current time.
    pub fn system_instruction<Tz>(&self, now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut text = format!(
            "You are the {} agent of a travel planner.\n\nInstructions:\n",
            self.name
        );
        for line in self.instructions {
            text.push_str("- ");
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(&format!(
            "\nThe current date and time is {}.",
            now.format("%Y-%m-%d %H:%M %Z")
        ));
        text
    }
}

pub fn research_prompt(trip: &TripRequest) -> String {
    let mut prompt = format!(
        "Research the best attractions and activities in {} for a {}-day {} trip. \
         The traveler enjoys: {}. Budget: {}. Flight Class: {}. \
         Hotel Rating: {}. Visa Requirement: {}. Travel Insurance: {}.",
        trip.destination,
        trip.duration_days,
        trip.theme_phrase(),
        trip.activities,
        trip.budget,
        trip.flight_class,
        trip.hotel_rating,
        trip.visa_required,
        trip.travel_insurance,
    );
    if trip.currency_rates {
        prompt.push_str(&format!(
            " Include current exchange rates for {} at the destination.",
            trip.currency
        ));
    }
    prompt
}

pub fn lodging_prompt(trip: &TripRequest, research: &str) -> String {
    let mut prompt = format!(
        "Find the best hotels and restaurants near popular attractions in {} for a {} trip. \
         Budget: {}. Hotel Rating: {}. Preferred activities: {}.",
        trip.destination,
        trip.theme_phrase(),
        trip.budget,
        trip.hotel_rating,
        trip.activities,
    );
    if !research.trim().is_empty() {
        prompt.push_str(&format!(" Research: {}.", research.trim()));
    }
    prompt
}

pub fn itinerary_prompt(
    trip: &TripRequest,
    research: &str,
    lodging: &str,
    offers: &RankedOfferSet,
) -> String {
    format!(
        "Based on the following data, create a {}-day itinerary for a {} trip to {}. \
         The traveler enjoys: {}. Budget: {}. Flight Class: {}. Hotel Rating: {}. \
         Visa Requirement: {}. Travel Insurance: {}. Research: {}. \
         Flights: {}. Hotels & Restaurants: {}.",
        trip.duration_days,
        trip.theme_phrase(),
        trip.destination,
        trip.activities,
        trip.budget,
        trip.flight_class,
        trip.hotel_rating,
        trip.visa_required,
        trip.travel_insurance,
        research,
        offers.to_prompt_json(),
        lodging,
    )
}

pub fn research_fallback(trip: &TripRequest) -> String {
    format!(
        "Popular attractions in {} for a {}-day {} trip include various cultural and historical sites. \
         Based on your preferences for {}, we recommend exploring local attractions and dining options.",
        trip.destination,
        trip.duration_days,
        trip.theme_phrase(),
        trip.activities,
    )
}

pub fn lodging_fallback(trip: &TripRequest) -> String {
    format!(
        "For a {}-day stay in {} on a {} budget with {} hotels, we recommend checking popular booking \
         sites like Booking.com, Hotels.com, or Airbnb. For restaurants, apps like TripAdvisor, Zomato, \
         or Yelp can help you find dining options that match your preferences.",
        trip.duration_days, trip.destination, trip.budget, trip.hotel_rating,
    )
}

pub fn itinerary_fallback(trip: &TripRequest) -> String {
    let days = trip.duration_days;
    let mut text = format!(
        "# {}-Day {} Trip to {}\n\n\
         ## Day 1\n\
         - Morning: Arrive at {} and check into your hotel\n\
         - Afternoon: Explore the area around your accommodation\n\
         - Evening: Dinner at a local restaurant\n",
        days, trip.theme, trip.destination, trip.destination,
    );
    if days > 2 {
        let middle = if days == 3 {
            "## Day 2".to_string()
        } else {
            format!("## Day 2-{}", days - 1)
        };
        text.push_str(&format!(
            "\n{}\n\
             - Morning: Visit popular attractions\n\
             - Afternoon: Engage in {}\n\
             - Evening: Try local cuisine\n",
            middle, trip.activities,
        ));
    }
    if days > 1 {
        text.push_str(&format!(
            "\n## Day {}\n\
             - Morning: Last-minute shopping for souvenirs\n\
             - Afternoon: Prepare for departure\n\
             - Evening: Return flight\n",
            days,
        ));
    }
    text.push_str(
        "\nNote: This is a simplified itinerary. For a more detailed and personalized plan, \
         please try again when the AI service is available.\n",
    );
    text
}

pub fn fallback_for(step: NarrativeStep, trip: &TripRequest) -> String {
    match step {
        NarrativeStep::Research => research_fallback(trip),
        NarrativeStep::Lodging => lodging_fallback(trip),
        NarrativeStep::Itinerary => itinerary_fallback(trip),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flights_results_parser::FlightOffer;
    use crate::flights_ranker::rank_offers;
    use crate::{HotelRating, TravelTheme};
    use chrono::{NaiveDate, Utc};

    fn trip(days: u8) -> TripRequest {
        TripRequest::builder("BOM", "DEL", NaiveDate::from_ymd_opt(2026, 3, 6).unwrap())
            .duration_days(days)
            .theme(TravelTheme::CoupleGetaway)
            .hotel_rating(HotelRating::FourStar)
            .visa_required(true)
            .build()
            .unwrap()
    }

    #[test]
    fn test_research_prompt_interpolation() {
        let prompt = research_prompt(&trip(5));
        assert!(prompt.starts_with(
            "Research the best attractions and activities in DEL for a 5-day couple getaway trip."
        ));
        assert!(prompt.contains("Hotel Rating: 4⭐."));
        assert!(prompt.contains("Visa Requirement: true."));
        assert!(!prompt.contains("exchange rates"));
    }

    #[test]
    fn test_itinerary_prompt_embeds_offers_and_narratives() {
        let offers = rank_offers(
            &[FlightOffer {
                price: Some(80.0),
                ..Default::default()
            }],
            3,
        );
        let prompt = itinerary_prompt(&trip(5), "R-TEXT", "L-TEXT", &offers);
        assert!(prompt.contains("create a 5-day itinerary for a couple getaway trip to DEL"));
        assert!(prompt.contains("Research: R-TEXT."));
        assert!(prompt.contains(r#"Flights: [{"flights":[],"price":80.0}]."#));
        assert!(prompt.contains("Hotels & Restaurants: L-TEXT."));

        let empty = itinerary_prompt(&trip(5), "", "", &RankedOfferSet::default());
        assert!(empty.contains("Flights: []."));
    }

    #[test]
    fn test_fallbacks_embed_destination_and_duration() {
        for step in [
            NarrativeStep::Research,
            NarrativeStep::Lodging,
            NarrativeStep::Itinerary,
        ] {
            for days in [1, 3, 5, 14] {
                let t = trip(days);
                let text = fallback_for(step, &t);
                assert!(text.contains("DEL"), "{:?} {}", step, days);
                assert!(
                    text.contains(&format!("{}-Day", days))
                        || text.contains(&format!("{}-day", days))
                );
                assert_eq!(text, fallback_for(step, &t), "deterministic");
            }
        }
    }

    #[test]
    fn test_itinerary_fallback_day_ranges() {
        let five = itinerary_fallback(&trip(5));
        assert!(five.starts_with("# 5-Day Couple Getaway Trip to DEL"));
        assert!(five.contains("## Day 2-4"));
        assert!(five.contains("## Day 5"));

        let one = itinerary_fallback(&trip(1));
        assert!(!one.contains("## Day 2"));

        let three = itinerary_fallback(&trip(3));
        assert!(three.contains("## Day 2\n"));
        assert!(three.contains("## Day 3"));
    }

    #[test]
    fn test_system_instruction() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let text = PLANNER.system_instruction(&now);
        assert!(text.contains("Planner agent"));
        assert!(text.contains("- Present the itinerary in a structured format.\n"));
        assert!(text.ends_with("The current date and time is 2026-03-01 09:30 UTC."));
        assert!(AgentProfile::for_step(NarrativeStep::Research).web_search);
        assert!(!AgentProfile::for_step(NarrativeStep::Itinerary).web_search);
    }
}
