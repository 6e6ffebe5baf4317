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

//! # Trip Request
//!
//! The traveler's inputs, validated once and then immutable.

use anyhow::{Result, bail, ensure};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_TRIP_DAYS: u8 = 1;
pub const MAX_TRIP_DAYS: u8 = 14;

pub const DEFAULT_CURRENCY: &str = "INR";
pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_ACTIVITIES: &str = "Relaxing on the beach, exploring historical sites";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TravelTheme {
    #[default]
    CoupleGetaway,
    FamilyVacation,
    AdventureTrip,
    SoloExploration,
}

impl TravelTheme {
    pub const ALL: [TravelTheme; 4] = [
        Self::CoupleGetaway,
        Self::FamilyVacation,
        Self::AdventureTrip,
        Self::SoloExploration,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::CoupleGetaway => "Couple Getaway",
            Self::FamilyVacation => "Family Vacation",
            Self::AdventureTrip => "Adventure Trip",
            Self::SoloExploration => "Solo Exploration",
        }
    }
}

impl fmt::Display for TravelTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TravelTheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "couplegetaway" | "couple" => Ok(Self::CoupleGetaway),
            "familyvacation" | "family" => Ok(Self::FamilyVacation),
            "adventuretrip" | "adventure" => Ok(Self::AdventureTrip),
            "soloexploration" | "solo" => Ok(Self::SoloExploration),
            _ => bail!(
                "Invalid travel theme: {}. Use: couple, family, adventure, solo",
                s
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BudgetTier {
    #[default]
    Economy,
    Standard,
    Luxury,
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Economy => "Economy",
            Self::Standard => "Standard",
            Self::Luxury => "Luxury",
        })
    }
}

impl FromStr for BudgetTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "economy" | "e" => Ok(Self::Economy),
            "standard" | "s" => Ok(Self::Standard),
            "luxury" | "l" => Ok(Self::Luxury),
            _ => bail!("Invalid budget: {}. Use: economy, standard, luxury", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlightClass {
    #[default]
    Economy,
    Business,
    FirstClass,
}

impl fmt::Display for FlightClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Economy => "Economy",
            Self::Business => "Business",
            Self::FirstClass => "First Class",
        })
    }
}

impl FromStr for FlightClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['_', '-', ' '], "").as_str() {
            "economy" | "e" => Ok(Self::Economy),
            "business" | "b" => Ok(Self::Business),
            "first" | "firstclass" | "f" => Ok(Self::FirstClass),
            _ => bail!("Invalid flight class: {}. Use: economy, business, first", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HotelRating {
    #[default]
    Any,
    ThreeStar,
    FourStar,
    FiveStar,
}

impl fmt::Display for HotelRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Any => "Any",
            Self::ThreeStar => "3⭐",
            Self::FourStar => "4⭐",
            Self::FiveStar => "5⭐",
        })
    }
}

impl FromStr for HotelRating {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().trim_end_matches('⭐').trim_end_matches("star").trim();
        match s.to_lowercase().as_str() {
            "any" | "" => Ok(Self::Any),
            "3" => Ok(Self::ThreeStar),
            "4" => Ok(Self::FourStar),
            "5" => Ok(Self::FiveStar),
            _ => bail!("Invalid hotel rating: {}. Use: any, 3, 4, 5", s),
        }
    }
}

/// Advisory problems with a request. They never block planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationWarning {
    ReturnBeforeDeparture {
        departure: NaiveDate,
        return_date: NaiveDate,
    },
    DepartureInPast {
        departure: NaiveDate,
        today: NaiveDate,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReturnBeforeDeparture {
                departure,
                return_date,
            } => write!(
                f,
                "Return date {} must be after departure date {}",
                return_date, departure
            ),
            Self::DepartureInPast { departure, today } => write!(
                f,
                "Departure date {} is before today ({})",
                departure, today
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRequest {
    pub origin: String,
    pub destination: String,
    pub duration_days: u8,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
    pub currency: String,
    pub locale: String,
    pub theme: TravelTheme,
    pub activities: String,
    pub budget: BudgetTier,
    pub flight_class: FlightClass,
    pub hotel_rating: HotelRating,
    pub visa_required: bool,
    pub travel_insurance: bool,
    pub currency_rates: bool,
}

impl TripRequest {
    pub fn builder(
        origin: impl Into<String>,
        destination: impl Into<String>,
        departure_date: NaiveDate,
    ) -> TripRequestBuilder {
        TripRequestBuilder {
            origin: origin.into(),
            destination: destination.into(),
            duration_days: 5,
            departure_date,
            return_date: None,
            currency: DEFAULT_CURRENCY.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            theme: TravelTheme::default(),
            activities: DEFAULT_ACTIVITIES.to_string(),
            budget: BudgetTier::default(),
            flight_class: FlightClass::default(),
            hotel_rating: HotelRating::default(),
            visa_required: false,
            travel_insurance: false,
            currency_rates: false,
        }
    }

    /// Theme as it reads inside a sentence ("a 5-day couple getaway trip").
    pub fn theme_phrase(&self) -> String {
        self.theme.label().to_lowercase()
    }

    pub fn validation_warnings(&self, today: NaiveDate) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        if self.return_date < self.departure_date {
            warnings.push(ValidationWarning::ReturnBeforeDeparture {
                departure: self.departure_date,
                return_date: self.return_date,
            });
        }
        if self.departure_date < today {
            warnings.push(ValidationWarning::DepartureInPast {
                departure: self.departure_date,
                today,
            });
        }
        warnings
    }

    fn validate(&self) -> Result<()> {
        ensure!(!self.origin.trim().is_empty(), "Origin code is required");
        ensure!(
            !self.destination.trim().is_empty(),
            "Destination code is required"
        );
        ensure!(
            (MIN_TRIP_DAYS..=MAX_TRIP_DAYS).contains(&self.duration_days),
            "Trip duration must be between {} and {} days, got {}",
            MIN_TRIP_DAYS,
            MAX_TRIP_DAYS,
            self.duration_days
        );
        ensure!(!self.currency.trim().is_empty(), "Currency is required");
        ensure!(!self.locale.trim().is_empty(), "Locale is required");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TripRequestBuilder {
    origin: String,
    destination: String,
    duration_days: u8,
    departure_date: NaiveDate,
    return_date: Option<NaiveDate>,
    currency: String,
    locale: String,
    theme: TravelTheme,
    activities: String,
    budget: BudgetTier,
    flight_class: FlightClass,
    hotel_rating: HotelRating,
    visa_required: bool,
    travel_insurance: bool,
    currency_rates: bool,
}

impl TripRequestBuilder {
    pub fn duration_days(mut self, days: u8) -> Self {
        self.duration_days = days;
        self
    }

    pub fn return_date(mut self, return_date: NaiveDate) -> Self {
        self.return_date = Some(return_date);
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn theme(mut self, theme: TravelTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn activities(mut self, activities: impl Into<String>) -> Self {
        self.activities = activities.into();
        self
    }

    pub fn budget(mut self, budget: BudgetTier) -> Self {
        self.budget = budget;
        self
    }

    pub fn flight_class(mut self, flight_class: FlightClass) -> Self {
        self.flight_class = flight_class;
        self
    }

    pub fn hotel_rating(mut self, hotel_rating: HotelRating) -> Self {
        self.hotel_rating = hotel_rating;
        self
    }

    pub fn visa_required(mut self, yes: bool) -> Self {
        self.visa_required = yes;
        self
    }

    pub fn travel_insurance(mut self, yes: bool) -> Self {
        self.travel_insurance = yes;
        self
    }

    pub fn currency_rates(mut self, yes: bool) -> Self {
        self.currency_rates = yes;
        self
    }

    /// Return date defaults to a week after departure.
    pub fn build(self) -> Result<TripRequest> {
        let return_date = match self.return_date {
            Some(d) => d,
            None => match self.departure_date.checked_add_days(Days::new(7)) {
                Some(d) => d,
                None => bail!("Departure date {} is out of range", self.departure_date),
            },
        };
        let request = TripRequest {
            origin: self.origin.trim().to_string(),
            destination: self.destination.trim().to_string(),
            duration_days: self.duration_days,
            departure_date: self.departure_date,
            return_date,
            currency: self.currency.trim().to_string(),
            locale: self.locale.trim().to_string(),
            theme: self.theme,
            activities: self.activities,
            budget: self.budget,
            flight_class: self.flight_class,
            hotel_rating: self.hotel_rating,
            visa_required: self.visa_required,
            travel_insurance: self.travel_insurance,
            currency_rates: self.currency_rates,
        };
        request.validate()?;
        Ok(request)
    }
}
