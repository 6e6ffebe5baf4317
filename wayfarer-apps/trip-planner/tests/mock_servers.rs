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

//! Local stand-ins for SerpApi and Gemini, served by axum on 127.0.0.1:0.

#![allow(dead_code)]

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wayfarer_trip_planner::PlannerConfig;

#[derive(Clone)]
pub struct Canned {
    pub status: u16,
    pub body: String,
}

impl Canned {
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    fn respond(&self) -> Response {
        (
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            [("content-type", "application/json")],
            self.body.clone(),
        )
            .into_response()
    }
}

/// Gemini success body with a single text part.
pub fn gemini_text(text: &str) -> Canned {
    Canned::ok(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    }))
}

pub fn offer(price: f64, departure_token: Option<&str>, booking_token: Option<&str>) -> Value {
    let mut offer = json!({
        "flights": [{
            "departure_airport": {"name": "Chhatrapati Shivaji", "id": "BOM", "time": "2026-03-06 06:20"},
            "arrival_airport": {"name": "Indira Gandhi", "id": "DEL", "time": "2026-03-06 08:35"},
            "duration": 135,
            "airline": "IndiGo",
            "flight_number": "6E 2011",
            "travel_class": "Economy"
        }],
        "total_duration": 135,
        "price": price,
        "type": "Round trip",
        "airline_logo": "https://example.test/6E.png"
    });
    if let Some(token) = departure_token {
        offer["departure_token"] = json!(token);
    }
    if let Some(token) = booking_token {
        offer["booking_token"] = json!(token);
    }
    offer
}

pub struct MockSetup {
    /// Initial search
    pub search: Canned,
    /// Searches carrying a `departure_token`
    pub booking: Canned,
    /// One entry per generateContent call, the last one repeats
    pub gemini: Vec<Canned>,
}

#[derive(Clone)]
struct MockState {
    setup: Arc<MockSetup>,
    search_calls: Arc<AtomicUsize>,
    booking_calls: Arc<AtomicUsize>,
    generate_calls: Arc<AtomicUsize>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    gemini_requests: Arc<Mutex<Vec<(Option<String>, String, Value)>>>,
}

pub struct MockServers {
    pub base_url: String,
    state: MockState,
    handle: tokio::task::JoinHandle<()>,
}

impl MockServers {
    pub async fn start(setup: MockSetup) -> Self {
        let state = MockState {
            setup: Arc::new(setup),
            search_calls: Arc::new(AtomicUsize::new(0)),
            booking_calls: Arc::new(AtomicUsize::new(0)),
            generate_calls: Arc::new(AtomicUsize::new(0)),
            queries: Arc::new(Mutex::new(Vec::new())),
            gemini_requests: Arc::new(Mutex::new(Vec::new())),
        };
        let app = Router::new()
            .route("/search", get(search))
            .route("/v1beta/models/:call", post(generate))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind local test listener");
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    /// Config pointing every provider at this server.
    pub fn config(&self) -> PlannerConfig {
        let mut config = PlannerConfig::new("serp-test-key", "gemini-test-key");
        config.flights_base_url = self.base_url.clone();
        config.gemini_base_url = self.base_url.clone();
        config.queries_per_second = 100;
        config.timeout_secs = Some(5);
        config
    }

    pub fn search_calls(&self) -> usize {
        self.state.search_calls.load(Ordering::SeqCst)
    }

    pub fn booking_calls(&self) -> usize {
        self.state.booking_calls.load(Ordering::SeqCst)
    }

    pub fn generate_calls(&self) -> usize {
        self.state.generate_calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<HashMap<String, String>> {
        self.state.queries.lock().unwrap().clone()
    }

    /// (api key header, path segment, JSON body) per generateContent call
    pub fn gemini_requests(&self) -> Vec<(Option<String>, String, Value)> {
        self.state.gemini_requests.lock().unwrap().clone()
    }
}

impl Drop for MockServers {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn search(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let is_booking = query.contains_key("departure_token");
    state.queries.lock().unwrap().push(query);
    if is_booking {
        state.booking_calls.fetch_add(1, Ordering::SeqCst);
        state.setup.booking.respond()
    } else {
        state.search_calls.fetch_add(1, Ordering::SeqCst);
        state.setup.search.respond()
    }
}

async fn generate(
    State(state): State<MockState>,
    Path(call): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let n = state.generate_calls.fetch_add(1, Ordering::SeqCst);
    let key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let json: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    state.gemini_requests.lock().unwrap().push((key, call, json));
    let replies = &state.setup.gemini;
    match replies.get(n).or(replies.last()) {
        Some(canned) => canned.respond(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
