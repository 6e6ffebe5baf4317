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

//! CLI for planning a trip: cheapest flights, booking links and narratives.

use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};
use clap::Parser;
use std::path::PathBuf;
use term_size;
use wayfarer_trip_planner::{
    BudgetTier, FlightClass, HotelRating, PipelineStage, PlanWarning, PlannerConfig, TravelTheme,
    TripPlan, TripPlanner, TripRequest,
};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "wayfarer-plan")]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Departure city airport code (e.g., BOM)
    #[arg(short, long, default_value = "BOM")]
    from: String,

    /// Destination airport code (e.g., DEL)
    #[arg(short, long, default_value = "DEL")]
    to: String,

    /// Trip duration in days (1-14)
    #[arg(short = 'n', long, default_value = "5")]
    days: u8,

    /// Travel theme: couple, family, adventure, solo
    #[arg(long, default_value = "couple")]
    theme: String,

    /// Activities you enjoy (free text)
    #[arg(short, long, default_value = wayfarer_trip_planner::DEFAULT_ACTIVITIES)]
    activities: String,

    /// Departure date (YYYY-MM-DD or YYYY/MM/DD), defaults to 30 days from today
    #[arg(short, long)]
    date: Option<String>,

    /// Return date (YYYY-MM-DD or YYYY/MM/DD), defaults to 7 days after departure
    #[arg(short = 'R', long)]
    return_date: Option<String>,

    /// Budget: economy, standard, luxury
    #[arg(short, long, default_value = "economy")]
    budget: String,

    /// Flight class: economy, business, first
    #[arg(short, long, default_value = "economy")]
    cabin: String,

    /// Hotel rating: any, 3, 4, 5
    #[arg(long, default_value = "any")]
    hotel_rating: String,

    /// Check visa requirements
    #[arg(long)]
    visa: bool,

    /// Include travel insurance
    #[arg(long)]
    insurance: bool,

    /// Include currency exchange rates
    #[arg(long)]
    currency_rates: bool,

    /// Currency for prices
    #[arg(long, default_value = wayfarer_trip_planner::DEFAULT_CURRENCY)]
    currency: String,

    /// Locale passed to the flight search
    #[arg(long, default_value = wayfarer_trip_planner::DEFAULT_LOCALE)]
    locale: String,

    /// SerpApi key
    #[arg(long, env = "SERPAPI_KEY", hide_env_values = true)]
    serpapi_key: Option<String>,

    /// Google AI Studio key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    google_api_key: Option<String>,

    /// JSON config file; flags above fill in missing keys
    #[arg(long)]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the whole plan as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

/// Configure logging based on verbosity level
fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse date string to NaiveDate
fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .context(format!(
            "Invalid date format: {}. Use YYYY-MM-DD or YYYY/MM/DD",
            s
        ))
}

fn load_config(args: &CliArgs) -> Result<PlannerConfig> {
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
    if args.timeout_secs.is_some() {
        config.timeout_secs = args.timeout_secs;
    }
    config.validate()?;
    Ok(config)
}

fn build_request(args: &CliArgs) -> Result<TripRequest> {
    let departure = match &args.date {
        Some(d) => parse_date(d)?,
        None => Local::now()
            .date_naive()
            .checked_add_days(Days::new(30))
            .context("Default departure date out of range")?,
    };
    let mut builder =
        TripRequest::builder(args.from.to_uppercase(), args.to.to_uppercase(), departure)
            .duration_days(args.days)
            .theme(args.theme.parse::<TravelTheme>()?)
            .activities(args.activities.clone())
            .budget(args.budget.parse::<BudgetTier>()?)
            .flight_class(args.cabin.parse::<FlightClass>()?)
            .hotel_rating(args.hotel_rating.parse::<HotelRating>()?)
            .visa_required(args.visa)
            .travel_insurance(args.insurance)
            .currency_rates(args.currency_rates)
            .currency(args.currency.to_uppercase())
            .locale(args.locale.clone());
    if let Some(rd) = &args.return_date {
        builder = builder.return_date(parse_date(rd)?);
    }
    builder.build().context("Failed to build trip request")
}

/// Get terminal width for responsive output
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(100)
}

fn equals_bar() -> String {
    "=".repeat(get_terminal_width().min(100))
}

fn print_banner(trip: &TripRequest) {
    println!("{}", equals_bar());
    println!("  ✈️  AI-Powered Travel Planner");
    println!("  🌟 Your {} to {} is about to begin! 🌟", trip.theme, trip.destination);
    println!("  Let's find the best flights, stays, and experiences for your unforgettable journey.");
    println!("{}\n", equals_bar());
}

/// Warnings raised while planning. Validation warnings are already shown
/// under the banner.
fn run_warnings(warnings: &[PlanWarning]) -> Vec<&PlanWarning> {
    warnings
        .iter()
        .filter(|w| !matches!(w, PlanWarning::Validation { .. }))
        .collect()
}

fn render_plan(plan: &TripPlan) {
    let width = get_terminal_width();

    println!("\n✈️  Cheapest Flight Options");
    let cards = plan.flight_cards();
    if cards.is_empty() {
        println!("⚠️ No flight data available.");
    }
    for card in &cards {
        println!("{}", card.render(width));
    }

    println!("\n🏨 Hotels & Restaurants\n{}", equals_bar());
    println!("{}", plan.narratives.lodging.text.trim());

    println!("\n🗺️  Your Personalized Itinerary\n{}", equals_bar());
    println!("{}", plan.narratives.itinerary.text.trim());

    let warnings = run_warnings(&plan.warnings);
    if !warnings.is_empty() {
        println!("\n{}", equals_bar());
        for warning in warnings {
            println!("⚠️ {}", warning);
        }
    }
    println!("\n✅ Travel plan generated successfully!");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    setup_logging(args.verbose);

    tracing::info!("Starting wayfarer-plan CLI");
    tracing::debug!("Args: from={} to={} days={}", args.from, args.to, args.days);

    let config = load_config(&args)?;
    tracing::debug!("Config: {:?}", config);
    let trip = build_request(&args)?;

    if !args.json {
        print_banner(&trip);
        for warning in trip.validation_warnings(Local::now().date_naive()) {
            println!("⚠️ {}", warning);
        }
    }

    let planner = TripPlanner::from_config(&config).context("Failed to create planner")?;
    let quiet = args.json;
    let plan = planner
        .plan_with_progress(&trip, |stage| {
            if !quiet && !matches!(stage, PipelineStage::Done | PipelineStage::Failed) {
                println!("{}", stage.label());
            }
        })
        .await
        .context("Please try again later or check your API keys")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?
        );
    } else {
        render_plan(&plan);
    }
    Ok(())
}
