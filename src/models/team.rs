//! Field team model.
//!
//! A team member (or crew, addressed by its lead) performs jobs. Each has a
//! home base, a daily job capacity, a travel radius, a capability set and an
//! availability calendar.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Availability, Coordinate};

/// Historical performance figures supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Fraction of jobs completed as scheduled (0.0..1.0).
    pub completion_rate: f64,
    /// Mean customer rating (0.0..5.0).
    pub customer_rating: f64,
    /// Mean on-site time per job in minutes.
    pub average_job_minutes: f64,
}

/// A team member that can be assigned jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    /// Unique team member identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Primary service region.
    pub region: String,
    /// Additional regions this member also covers.
    pub subregions: Vec<String>,
    /// Declared capability tags.
    pub specializations: BTreeSet<String>,
    /// Maximum jobs per day.
    pub capacity: u32,
    /// Maximum one-way distance from the home base, in miles.
    pub travel_radius_miles: f64,
    /// Home base street address.
    pub home_address: String,
    /// Home base coordinate. `None` = not geocoded.
    pub home_coordinate: Option<Coordinate>,
    /// Working calendar.
    pub availability: Availability,
    pub performance: PerformanceMetrics,
}

impl TeamMember {
    /// Creates a member with capacity 8 and a 50 mile radius.
    pub fn new(id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            region: region.into(),
            subregions: Vec::new(),
            specializations: BTreeSet::new(),
            capacity: 8,
            travel_radius_miles: 50.0,
            home_address: String::new(),
            home_coordinate: None,
            availability: Availability::always(),
            performance: PerformanceMetrics::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_subregion(mut self, region: impl Into<String>) -> Self {
        self.subregions.push(region.into());
        self
    }

    pub fn with_specialization(mut self, tag: impl Into<String>) -> Self {
        self.specializations.insert(tag.into());
        self
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_travel_radius(mut self, miles: f64) -> Self {
        self.travel_radius_miles = miles;
        self
    }

    pub fn with_home(mut self, address: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        self.home_address = address.into();
        self.home_coordinate = Some(Coordinate::new(latitude, longitude));
        self
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    pub fn with_performance(mut self, performance: PerformanceMetrics) -> Self {
        self.performance = performance;
        self
    }

    /// The usable home-base coordinate, if any.
    pub fn home(&self) -> Option<Coordinate> {
        self.home_coordinate.filter(|c| c.is_valid())
    }

    /// Whether `region` is this member's region or one of its subregions
    /// (ASCII case-insensitive).
    pub fn serves_region(&self, region: &str) -> bool {
        self.region.eq_ignore_ascii_case(region)
            || self.subregions.iter().any(|r| r.eq_ignore_ascii_case(region))
    }

    /// Whether every tag in `required` is declared by this member.
    pub fn covers(&self, required: &BTreeSet<String>) -> bool {
        required.is_subset(&self.specializations)
    }

    /// Tags in `required` this member lacks.
    pub fn missing_specializations<'a>(&self, required: &'a BTreeSet<String>) -> Vec<&'a str> {
        required
            .iter()
            .filter(|tag| !self.specializations.contains(*tag))
            .map(String::as_str)
            .collect()
    }
}
