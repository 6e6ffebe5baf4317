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

//! # Trip Narratives
//!
//! Research, lodging and itinerary texts. Every step yields a text: a
//! generation failure is replaced by the step's deterministic fallback.

use serde::Serialize;

use crate::TripRequest;
use crate::flights_ranker::RankedOfferSet;
use crate::narrative_prompts::{self, AgentProfile, NarrativeStep};
use crate::outcome::Outcome;
use crate::text_generation::TextGenerator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NarrativeSource {
    Generated,
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Narrative {
    pub text: String,
    pub source: NarrativeSource,
}

impl Narrative {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, NarrativeSource::Fallback { .. })
    }

    /// Build from the parts of a narrative step's outcome.
    pub fn from_parts(text: String, fallback_reason: Option<String>) -> Self {
        let source = match fallback_reason {
            Some(reason) => NarrativeSource::Fallback { reason },
            None => NarrativeSource::Generated,
        };
        Self { text, source }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrativeResult {
    pub research: Narrative,
    pub lodging: Narrative,
    pub itinerary: Narrative,
}

impl NarrativeResult {
    pub fn fallback_count(&self) -> usize {
        [&self.research, &self.lodging, &self.itinerary]
            .iter()
            .filter(|n| n.is_fallback())
            .count()
    }
}

pub struct TripNarrativeGenerator<'a, G> {
    generator: &'a G,
}

impl<'a, G: TextGenerator> TripNarrativeGenerator<'a, G> {
    pub fn new(generator: &'a G) -> Self {
        Self { generator }
    }

    async fn run_step(
        &self,
        step: NarrativeStep,
        trip: &TripRequest,
        prompt: String,
    ) -> Outcome<String> {
        let agent = AgentProfile::for_step(step);
        match self.generator.generate(agent, &prompt).await {
            Ok(text) => Outcome::Ok(text),
            Err(e) => {
                tracing::warn!("{} generation failed, using fallback: {}", step, e);
                Outcome::fallback(
                    narrative_prompts::fallback_for(step, trip),
                    format!("Error generating {}: {}", step, e),
                )
            }
        }
    }

    pub async fn research(&self, trip: &TripRequest) -> Outcome<String> {
        self.run_step(
            NarrativeStep::Research,
            trip,
            narrative_prompts::research_prompt(trip),
        )
        .await
    }

    /// Takes the research text, live or fallback.
    pub async fn find_lodging(&self, trip: &TripRequest, research: &str) -> Outcome<String> {
        self.run_step(
            NarrativeStep::Lodging,
            trip,
            narrative_prompts::lodging_prompt(trip, research),
        )
        .await
    }

    pub async fn build_itinerary(
        &self,
        trip: &TripRequest,
        research: &str,
        lodging: &str,
        offers: &RankedOfferSet,
    ) -> Outcome<String> {
        self.run_step(
            NarrativeStep::Itinerary,
            trip,
            narrative_prompts::itinerary_prompt(trip, research, lodging, offers),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GenerationError;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    /// Answers from a script, one entry per call, and records prompts.
    struct ScriptedGenerator {
        script: Mutex<Vec<Result<String, GenerationError>>>,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedGenerator {
        fn new(mut script: Vec<Result<String, GenerationError>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            agent: &AgentProfile,
            prompt: &str,
        ) -> Result<String, GenerationError> {
            self.prompts
                .lock()
                .unwrap()
                .push((agent.name.to_string(), prompt.to_string()));
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(GenerationError::Transport("script exhausted".into())))
        }
    }

    fn trip() -> TripRequest {
        TripRequest::builder("BOM", "DEL", NaiveDate::from_ymd_opt(2026, 3, 6).unwrap())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_live_text_passes_through() {
        let generator = ScriptedGenerator::new(vec![Ok("R".into())]);
        let narratives = TripNarrativeGenerator::new(&generator);
        let outcome = narratives.research(&trip()).await;
        assert!(matches!(&outcome, Outcome::Ok(t) if t == "R"));
        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts[0].0, "Researcher");
    }

    #[tokio::test]
    async fn test_failure_yields_fallback() {
        let generator = ScriptedGenerator::new(vec![Err(GenerationError::Provider {
            status: Some(503),
            message: "overloaded".into(),
        })]);
        let narratives = TripNarrativeGenerator::new(&generator);
        let t = trip();
        let (text, reason) = narratives.find_lodging(&t, "R").await.into_parts().unwrap();
        let narrative = Narrative::from_parts(text, reason);
        assert!(narrative.is_fallback());
        assert_eq!(narrative.text, narrative_prompts::lodging_fallback(&t));
        match narrative.source {
            NarrativeSource::Fallback { reason } => {
                assert!(reason.starts_with("Error generating hotels & restaurants"));
                assert!(reason.contains("overloaded"));
            }
            NarrativeSource::Generated => panic!("expected fallback"),
        }
    }

    #[tokio::test]
    async fn test_itinerary_prompt_uses_inputs() {
        let generator = ScriptedGenerator::new(vec![Ok("I".into())]);
        let narratives = TripNarrativeGenerator::new(&generator);
        let _ = narratives
            .build_itinerary(&trip(), "R", "FALLBACK-L", &RankedOfferSet::default())
            .await;
        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts[0].0, "Planner");
        assert!(prompts[0].1.contains("Flights: []"));
        assert!(prompts[0].1.contains("Hotels & Restaurants: FALLBACK-L"));
    }
}
