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

//! # Text Generation Client
//!
//! Effectful (network) calls to the Gemini `generateContent` endpoint.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wayfarer_query_queues::QueryQueue;

use crate::PlannerConfig;
use crate::errors::GenerationError;
use crate::narrative_prompts::AgentProfile;

/// A text-generation service.
pub trait TextGenerator: Send + Sync {
    fn generate(
        &self,
        agent: &AgentProfile,
        prompt: &str,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

// Wire types

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    system_instruction: SystemInstruction<'a>,
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Extract the generated text out of a successful response body.
fn parse_generated_text(body: &str) -> Result<String, GenerationError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(GenerationError::Provider {
            status: None,
            message: format!("prompt blocked: {}", reason),
        });
    }

    let Some(candidate) = response.candidates.first() else {
        return Err(GenerationError::Provider {
            status: None,
            message: "no candidates returned".to_string(),
        });
    };

    let text: String = candidate
        .content
        .iter()
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.text.as_deref())
        .collect();

    if text.trim().is_empty() {
        return Err(GenerationError::Provider {
            status: None,
            message: format!(
                "empty candidate (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ),
        });
    }
    Ok(text)
}

/// Human-readable message out of an error body, or a preview of it.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error }) => match error.status {
            Some(status) => format!("{}: {}", status, error.message),
            None => error.message,
        },
        Err(_) => body.chars().take(500).collect(),
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Arc<wreq::Client>,
    query_queue: QueryQueue,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &PlannerConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let mut builder = wreq::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder
                .timeout(Duration::from_secs(secs))
                .connect_timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        let query_queue = QueryQueue::with_qps_limit(config.queries_per_second as u64)
            .with_max_retries(config.max_retries);
        Ok(Self {
            client: Arc::new(client),
            query_queue,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.gemini_base_url.trim_end_matches('/'),
                config.model
            ),
            api_key: config.gemini_api_key.clone(),
        })
    }

    fn request_body(agent: &AgentProfile, prompt: &str) -> Result<String, GenerationError> {
        let system = agent.system_instruction(&chrono::Local::now());
        let request = GenerateContentRequest {
            system_instruction: SystemInstruction {
                parts: vec![Part { text: &system }],
            },
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            tools: if agent.web_search {
                vec![Tool {
                    google_search: serde_json::Map::new(),
                }]
            } else {
                Vec::new()
            },
        };
        serde_json::to_string(&request).map_err(|e| GenerationError::Malformed(e.to_string()))
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        agent: &AgentProfile,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let body = Self::request_body(agent, prompt)?;
        let client_inner = Arc::clone(&self.client);
        let endpoint = self.endpoint.clone();
        let api_key = self.api_key.clone();
        tracing::debug!("[generate] {} agent, {} char prompt", agent.name, prompt.len());

        let start = Instant::now();
        let text = self
            .query_queue
            .run(move |attempt| {
                let http_client = client_inner.clone();
                let endpoint = endpoint.clone();
                let api_key = api_key.clone();
                let body = body.clone();
                async move {
                    tracing::trace!("[generate] attempt {}", attempt);
                    let resp = http_client
                        .post(&endpoint)
                        .header("Content-Type", "application/json")
                        .header("x-goog-api-key", api_key)
                        .body(body)
                        .send()
                        .await
                        .map_err(|e| GenerationError::Transport(e.to_string()))?;
                    let status = resp.status();
                    let body = resp
                        .text()
                        .await
                        .map_err(|e| GenerationError::Transport(e.to_string()))?;
                    if !status.is_success() {
                        return Err(GenerationError::Provider {
                            status: Some(status.as_u16()),
                            message: error_message(&body),
                        });
                    }
                    parse_generated_text(&body)
                }
            })
            .await?;
        tracing::info!(
            "{} agent answered in {:?} ({} chars)",
            agent.name,
            start.elapsed(),
            text.len()
        );
        Ok(text)
    }
}
