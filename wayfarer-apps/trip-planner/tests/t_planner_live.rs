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

//! Live end-to-end planning run against SerpApi and Gemini.
//!
//! Needs SERPAPI_KEY and GOOGLE_API_KEY in the environment.
//!
//! Run with: cargo test --test t_planner_live -- --include-ignored

use anyhow::{Context, Result};
use chrono::{Days, Months, NaiveDate};
use wayfarer_trip_planner::{PipelineStage, PlannerConfig, TravelTheme, TripPlanner, TripRequest};

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn live_config() -> Result<PlannerConfig> {
    let serpapi_key = std::env::var("SERPAPI_KEY").context("SERPAPI_KEY not set")?;
    let gemini_key = std::env::var("GOOGLE_API_KEY").context("GOOGLE_API_KEY not set")?;
    let mut config = PlannerConfig::new(serpapi_key, gemini_key);
    config.timeout_secs = Some(60);
    Ok(config)
}

#[tokio::test]
#[ignore = "hits SerpApi and Gemini, needs API keys"]
async fn test_live_plan_bom_goi() -> Result<()> {
    let planner = TripPlanner::from_config(&live_config()?)?;
    let departure = today() + Months::new(2);
    let trip = TripRequest::builder("BOM", "GOI", departure)
        .duration_days(4)
        .return_date(departure + Days::new(4))
        .theme(TravelTheme::CoupleGetaway)
        .build()?;

    let mut seen = Vec::new();
    let plan = planner
        .plan_with_progress(&trip, |stage| {
            println!("{}", stage.label());
            seen.push(stage);
        })
        .await?;

    assert_eq!(plan.final_stage(), PipelineStage::Done);
    assert_eq!(seen.last(), Some(&PipelineStage::Done));
    assert!(plan.offers.len() <= 3);
    assert_eq!(plan.links.len(), plan.offers.len());
    for card in plan.flight_cards() {
        println!("{}", card.render(60));
        assert!(card.booking_url == "#" || card.booking_url.contains("?tfs="));
    }
    for warning in &plan.warnings {
        println!("⚠️ {}", warning);
    }
    assert!(!plan.narratives.itinerary.text.is_empty());
    println!("\n{}", plan.narratives.itinerary.text);
    Ok(())
}
