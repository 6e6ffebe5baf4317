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

//! # Unified MCP Server Entry Point
//!
//! Supports stdio and HTTP transports via subcommand.

use anyhow::{Context, Error, Result};
use chrono::{Days, Local, NaiveDate};
use clap::{Parser, Subcommand};
use rmcp::handler::server::{ServerHandler, tool::ToolRouter, wrapper::Parameters};
use rmcp::service::serve_server;
use rmcp::tool;
use rmcp::tool_router;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wayfarer_trip_planner::{
    BookingLink, FlightCard, GeminiClient, PlannerConfig, SerpApiFlightsClient, TripPlanner,
    TripRequest,
};

type LivePlanner = TripPlanner<SerpApiFlightsClient, GeminiClient>;

#[derive(Parser, Debug)]
#[command(name = "wayfarer-travel-mcp")]
#[command(
    author,
    version,
    about = "MCP server for trip planning (flights, booking links, itineraries)"
)]
struct Args {
    /// SerpApi key
    #[arg(long, global = true, env = "SERPAPI_KEY", hide_env_values = true)]
    serpapi_key: Option<String>,

    /// Google AI Studio key
    #[arg(long, global = true, env = "GOOGLE_API_KEY", hide_env_values = true)]
    google_api_key: Option<String>,

    /// JSON config file; the key flags fill in keys it leaves out
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run MCP server over stdio (for Claude Desktop, etc.)
    Stdio,

    /// Run MCP server over HTTP
    Http {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, default_value = "8080")]
        port: u16,
    },
}

#[derive(Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub struct FlightsInput {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

#[derive(Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub struct PlanTripInput {
    #[serde(flatten)]
    pub flights: FlightsInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotel_rating: Option<String>,
    #[serde(default)]
    pub visa_required: bool,
    #[serde(default)]
    pub travel_insurance: bool,
    #[serde(default)]
    pub currency_rates: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .context(format!("Invalid date format: {}. Use YYYY-MM-DD", s))
}

impl PlanTripInput {
    fn to_request(&self) -> Result<TripRequest> {
        let f = &self.flights;
        let departure = match &f.date {
            Some(d) => parse_date(d)?,
            None => Local::now()
                .date_naive()
                .checked_add_days(Days::new(30))
                .context("Default departure date out of range")?,
        };
        let mut builder =
            TripRequest::builder(f.from.to_uppercase(), f.to.to_uppercase(), departure);
        if let Some(rd) = &f.return_date {
            builder = builder.return_date(parse_date(rd)?);
        }
        if let Some(currency) = &f.currency {
            builder = builder.currency(currency.to_uppercase());
        }
        if let Some(locale) = &f.locale {
            builder = builder.locale(locale.clone());
        }
        if let Some(days) = self.days {
            builder = builder.duration_days(days);
        }
        if let Some(theme) = &self.theme {
            builder = builder.theme(theme.parse()?);
        }
        if let Some(activities) = &self.activities {
            builder = builder.activities(activities.clone());
        }
        if let Some(budget) = &self.budget {
            builder = builder.budget(budget.parse()?);
        }
        if let Some(flight_class) = &self.flight_class {
            builder = builder.flight_class(flight_class.parse()?);
        }
        if let Some(rating) = &self.hotel_rating {
            builder = builder.hotel_rating(rating.parse()?);
        }
        builder
            .visa_required(self.visa_required)
            .travel_insurance(self.travel_insurance)
            .currency_rates(self.currency_rates)
            .build()
    }
}

#[derive(Clone)]
pub struct TravelPlannerServer {
    planner: Arc<LivePlanner>,
    tool_router: ToolRouter<Self>,
}

impl TravelPlannerServer {
    pub fn new(planner: Arc<LivePlanner>) -> Self {
        Self {
            planner,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl TravelPlannerServer {
    #[tool(
        name = "plan_trip",
        description = "Plan a trip: cheapest 3 flights with booking links, destination research, hotels & restaurants, and a day-by-day itinerary. Parameters: from (IATA), to (IATA), date (YYYY-MM-DD, default today+30), return_date (YYYY-MM-DD, default date+7), days (1-14, default 5), theme (couple/family/adventure/solo), activities (free text), budget (economy/standard/luxury), flight_class (economy/business/first), hotel_rating (any/3/4/5), visa_required, travel_insurance, currency_rates, currency (default INR), locale (default en)."
    )]
    async fn plan_trip(&self, params: Parameters<PlanTripInput>) -> Result<String, String> {
        let trip = params.0.to_request().map_err(|e| format!("Invalid trip: {e}"))?;
        let plan = self
            .planner
            .plan(&trip)
            .await
            .map_err(|e| format!("Trip planning failed: {e}"))?;
        serde_json::to_string(&serde_json::json!({
            "flight_cards": plan.flight_cards(),
            "plan": plan,
        }))
        .map_err(|e| e.to_string())
    }

    #[tool(
        name = "search_flights",
        description = "Search the cheapest 3 flights using Google Flights via SerpApi, without booking links or narratives. Parameters: from (IATA), to (IATA), date (YYYY-MM-DD, default today+30), return_date (YYYY-MM-DD, default date+7), currency (default INR), locale (default en)."
    )]
    async fn search_flights(&self, params: Parameters<FlightsInput>) -> Result<String, String> {
        let input = PlanTripInput {
            flights: params.0,
            ..Default::default()
        };
        let trip = input.to_request().map_err(|e| format!("Invalid trip: {e}"))?;
        let (offers, search_params) = self
            .planner
            .search_flights(&trip)
            .await
            .map_err(|e| format!("Flight search failed: {e}"))?;
        let cards: Vec<FlightCard> = offers
            .iter()
            .map(|offer| FlightCard::from_offer(offer, &BookingLink::Inert, &trip.currency))
            .collect();
        serde_json::to_string(&serde_json::json!({
            "search_params": search_params,
            "offers": offers,
            "flight_cards": cards,
        }))
        .map_err(|e| e.to_string())
    }
}

impl ServerHandler for TravelPlannerServer {
    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl Future<Output = Result<rmcp::model::ListToolsResult, rmcp::ErrorData>> + Send + '_
    {
        tracing::debug!(
            "list_tools called, tools count: {}",
            self.tool_router.list_all().len()
        );
        Box::pin(async move {
            let tools = self.tool_router.list_all();
            Ok(rmcp::model::ListToolsResult::with_all_items(tools))
        })
    }

    fn call_tool(
        &self,
        request: rmcp::model::CallToolRequestParam,
        context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl Future<Output = Result<rmcp::model::CallToolResult, rmcp::ErrorData>> + Send + '_
    {
        let router = self.tool_router.clone();
        let self_clone = self.clone();
        Box::pin(async move {
            let context =
                rmcp::handler::server::tool::ToolCallContext::new(&self_clone, request, context);
            router.call(context).await
        })
    }

    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            protocol_version: rmcp::model::ProtocolVersion::V_2025_03_26,
            capabilities: rmcp::model::ServerCapabilities {
                tools: Some(rmcp::model::ToolsCapability::default()),
                ..Default::default()
            },
            server_info: rmcp::model::Implementation::from_build_env(),
            instructions: Some(
                "Trip planner: use search_flights for prices only, plan_trip for a full plan."
                    .to_string(),
            ),
        }
    }
}

fn load_config(args: &Args) -> Result<PlannerConfig> {
    let mut config = match &args.config {
        Some(path) => PlannerConfig::from_json_file(path)?,
        None => PlannerConfig::new(String::new(), String::new()),
    };
    if config.serpapi_key.trim().is_empty() {
        config.serpapi_key = args
            .serpapi_key
            .clone()
            .context("SerpApi key missing: pass --serpapi-key or set SERPAPI_KEY")?;
    }
    if config.gemini_api_key.trim().is_empty() {
        config.gemini_api_key = args
            .google_api_key
            .clone()
            .context("Google API key missing: pass --google-api-key or set GOOGLE_API_KEY")?;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".to_string().into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_writer(std::io::stderr),
        )
        .init();

    tracing::debug!("Parsing arguments...");
    let args = Args::parse();
    tracing::debug!("Parsed command: {:?}", args.command);

    let config = load_config(&args)?;
    tracing::debug!("Config: {:?}", config);
    let planner = Arc::new(TripPlanner::from_config(&config).context("Failed to create planner")?);
    tracing::debug!("Planner created");

    match args.command {
        Command::Stdio => {
            eprintln!("Starting MCP server over stdio...");
            let server = TravelPlannerServer::new(planner);
            let (stdin, stdout) = rmcp::transport::io::stdio();
            let _running = serve_server(Arc::new(server), (stdin, stdout))
                .await
                .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;
            tracing::debug!("Server running. Press Ctrl+C to stop.");
            std::future::pending::<()>().await;
        }
        Command::Http { host, port } => {
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .context("Invalid host:port")?;
            tracing::info!("Starting MCP server over HTTP on {}", addr);
            let server = TravelPlannerServer::new(planner);
            let session_manager = Arc::new(LocalSessionManager::default());
            let config = StreamableHttpServerConfig {
                stateful_mode: true,
                ..Default::default()
            };
            let service =
                StreamableHttpService::new(move || Ok(server.clone()), session_manager, config);
            let app = axum::Router::new().nest_service("/mcp", service);
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .context("Failed to bind to address")?;
            tracing::debug!("Listening on {}", addr);
            axum::serve(listener, app)
                .await
                .context("HTTP server error")?;
        }
    }

    Ok(())
}
