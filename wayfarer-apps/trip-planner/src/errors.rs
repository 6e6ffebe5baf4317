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

//! # Error taxonomy
//!
//! One error type per external collaborator. Which of them abort a run is
//! decided by the pipeline through [`crate::Outcome`], never by matching on
//! variants at the call site.

use thiserror::Error;
use wayfarer_query_queues::{QueryQueueError, Transient};

/// Failure of the flight-search provider. Fatal for a planning run.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("flight search request failed: {0}")]
    Transport(String),

    #[error("flight search returned HTTP {status}: {body_preview}")]
    Http { status: u16, body_preview: String },

    #[error("flight search provider reported an error: {0}")]
    Api(String),

    #[error("flight search response does not match the expected schema: {0}")]
    Schema(#[source] serde_json::Error),

    #[error("flight search call gate is closed")]
    QueueClosed,
}

impl Transient for ProviderError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<QueryQueueError<ProviderError>> for ProviderError {
    fn from(e: QueryQueueError<ProviderError>) -> Self {
        e.into_inner().unwrap_or(ProviderError::QueueClosed)
    }
}

/// Failure of the text-generation service.
///
/// `Provider` covers everything the service itself reported (error bodies,
/// blocked prompts, empty candidates); `Transport` is the network layer.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("text generation service error (status {status:?}): {message}")]
    Provider { status: Option<u16>, message: String },

    #[error("text generation request failed: {0}")]
    Transport(String),

    #[error("text generation response is malformed: {0}")]
    Malformed(String),
}

impl GenerationError {
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }
}

impl Transient for GenerationError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Provider {
                status: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<QueryQueueError<GenerationError>> for GenerationError {
    fn from(e: QueryQueueError<GenerationError>) -> Self {
        e.into_inner()
            .unwrap_or_else(|| GenerationError::Transport("call gate is closed".into()))
    }
}

/// Failure to turn a continuation token into a booking token.
#[derive(Debug, Error)]
pub enum BookingResolutionError {
    #[error("booking lookup failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("booking lookup returned {available} offer(s), none at position {index}")]
    MissingEntry { index: usize, available: usize },

    #[error("booking lookup entry at position {index} carries no booking token")]
    MissingToken { index: usize },
}

/// Errors that end a planning run.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    FlightSearch(#[from] ProviderError),
}
