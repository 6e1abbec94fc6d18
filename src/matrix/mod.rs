//! Pairwise distance/duration tables.
//!
//! A [`DistanceMatrix`] is rebuilt per call from a set of [`Location`]s.
//! Locations without a usable coordinate are omitted (and listed in
//! [`DistanceMatrix::omitted_ids`]).
//!
//! # Directionality
//! Distance is symmetric. Duration is directional: the leg `from → to` uses
//! the urban/rural classification of the destination, so
//! `duration(a, b)` and `duration(b, a)` may differ.

mod cache;

pub use cache::{CacheStats, DistanceCache};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geo::{estimate_travel_time, haversine_miles, is_urban};
use crate::models::{Coordinate, Job, TeamMember};

/// A point that can appear in a distance matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub address: String,
    pub coordinate: Option<Coordinate>,
}

impl Location {
    pub fn new(id: impl Into<String>, address: impl Into<String>, coordinate: Option<Coordinate>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            coordinate,
        }
    }

    /// A job's visit location.
    pub fn from_job(job: &Job) -> Self {
        Self::new(job.id.clone(), job.address.clone(), job.location())
    }

    /// A team member's home base.
    pub fn home_of(team: &TeamMember) -> Self {
        Self::new(team.id.clone(), team.home_address.clone(), team.home())
    }

    fn is_urban(&self) -> bool {
        is_urban(&self.address, self.coordinate.as_ref())
    }
}

/// Distance (miles) and duration (minutes) of one directed leg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixEntry {
    pub distance: f64,
    pub duration: u32,
}

/// Row-major pairwise table: `entries[from][to]`.
#[derive(Debug, Clone, Default)]
pub struct DistanceMatrix {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    entries: Vec<Vec<MatrixEntry>>,
    omitted: Vec<String>,
}

impl DistanceMatrix {
    /// Builds the matrix from scratch.
    pub fn build(locations: &[Location]) -> Self {
        Self::build_with(locations, |a, b| haversine_miles(a, b))
    }

    /// Builds the matrix, memoizing great-circle distances in `cache`.
    pub fn build_cached(locations: &[Location], cache: &DistanceCache) -> Self {
        Self::build_with(locations, |a, b| cache.distance(a, b))
    }

    fn build_with<F>(locations: &[Location], mut distance: F) -> Self
    where
        F: FnMut(&Coordinate, &Coordinate) -> f64,
    {
        let mut ids = Vec::new();
        let mut points = Vec::new();
        let mut urban = Vec::new();
        let mut omitted = Vec::new();

        for loc in locations {
            match loc.coordinate.filter(|c| c.is_valid()) {
                Some(c) => {
                    ids.push(loc.id.clone());
                    points.push(c);
                    urban.push(loc.is_urban());
                }
                None => omitted.push(loc.id.clone()),
            }
        }

        let n = points.len();
        let mut entries = vec![vec![MatrixEntry::default(); n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = distance(&points[i], &points[j]);
                entries[i][j] = MatrixEntry {
                    distance: d,
                    duration: estimate_travel_time(d, urban[j]),
                };
                entries[j][i] = MatrixEntry {
                    distance: d,
                    duration: estimate_travel_time(d, urban[i]),
                };
            }
        }

        let index = ids.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect();
        Self {
            ids,
            index,
            entries,
            omitted,
        }
    }

    /// Number of locations in the matrix.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Location ids in row order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Ids left out for lack of a usable coordinate.
    pub fn omitted_ids(&self) -> &[String] {
        &self.omitted
    }

    /// Row index of a location id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Entry for the directed leg `from → to` by id.
    pub fn get(&self, from: &str, to: &str) -> Option<MatrixEntry> {
        let i = self.index_of(from)?;
        let j = self.index_of(to)?;
        Some(self.entries[i][j])
    }

    /// Distance between rows `i` and `j`.
    #[inline]
    pub fn distance_at(&self, i: usize, j: usize) -> f64 {
        self.entries[i][j].distance
    }

    /// Duration of the directed leg from row `i` to row `j`.
    #[inline]
    pub fn duration_at(&self, i: usize, j: usize) -> u32 {
        self.entries[i][j].duration
    }
}
