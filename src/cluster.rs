//! Radius-based spatial clustering of jobs.
//!
//! # Algorithm
//!
//! Greedy single pass over jobs in input order:
//! 1. Take the next unprocessed job as the seed.
//! 2. Gather every unprocessed job within `max_radius_miles` of the seed
//!    (distance measured from the seed, not transitively).
//! 3. If at least `min_size` jobs were gathered, emit one cluster with
//!    center = centroid, radius = max member distance from the center,
//!    density = members / (π·radius²).
//! 4. Otherwise emit each gathered job as a singleton (radius 0, density 1).
//!
//! Jobs without a usable coordinate are skipped and returned separately.
//!
//! # Complexity
//! O(n²) distance evaluations in the worst case.

use std::f64::consts::PI;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo::{centroid, haversine_miles};
use crate::models::{Coordinate, Job};

/// Clustering parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Maximum distance from the seed job, miles (default: 25).
    /// Negative or NaN values act as 0.
    pub max_radius_miles: f64,
    /// Minimum members for a multi-job cluster (default: 2).
    pub min_size: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_radius_miles: 25.0,
            min_size: 2,
        }
    }
}

impl ClusterConfig {
    pub fn with_max_radius(mut self, miles: f64) -> Self {
        self.max_radius_miles = miles.max(0.0);
        self
    }

    /// Radius actually applied, never negative.
    pub fn radius(&self) -> f64 {
        self.max_radius_miles.max(0.0)
    }

    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size.max(1);
        self
    }
}

/// A group of nearby jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographicCluster {
    pub id: String,
    pub center: Coordinate,
    /// Member job ids, seed first.
    pub job_ids: Vec<String>,
    /// Max member distance from `center`, miles.
    pub radius_miles: f64,
    /// Jobs per square mile. Singletons report 1; a zero-radius cluster of
    /// co-located jobs reports its member count.
    pub density: f64,
}

impl GeographicCluster {
    pub fn size(&self) -> usize {
        self.job_ids.len()
    }

    pub fn is_singleton(&self) -> bool {
        self.job_ids.len() == 1
    }
}

/// Clustering output.
#[derive(Debug, Clone, Default)]
pub struct ClusteringResult {
    pub clusters: Vec<GeographicCluster>,
    /// Jobs skipped for lack of a usable coordinate.
    pub skipped_job_ids: Vec<String>,
}

/// Groups jobs by proximity.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use u_fieldops::cluster::{cluster_jobs, ClusterConfig};
/// use u_fieldops::models::Job;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
/// let jobs = vec![
///     Job::new("J1", "a", day).with_coordinate(40.70, -74.00),
///     Job::new("J2", "b", day).with_coordinate(40.71, -74.01),
///     Job::new("J3", "c", day).with_coordinate(34.05, -118.24),
/// ];
/// let result = cluster_jobs(&jobs, &ClusterConfig::default());
/// assert_eq!(result.clusters.len(), 2);
/// assert_eq!(result.clusters[0].size(), 2);
/// ```
pub fn cluster_jobs(jobs: &[Job], config: &ClusterConfig) -> ClusteringResult {
    let mut result = ClusteringResult::default();

    let located: Vec<(&Job, Coordinate)> = jobs
        .iter()
        .filter_map(|job| match job.location() {
            Some(c) => Some((job, c)),
            None => {
                result.skipped_job_ids.push(job.id.clone());
                None
            }
        })
        .collect();

    let mut processed = vec![false; located.len()];
    let max_radius = config.radius();

    for seed in 0..located.len() {
        if processed[seed] {
            continue;
        }
        let seed_point = located[seed].1;

        // The seed always belongs to its own group.
        let members: Vec<usize> = std::iter::once(seed)
            .chain((seed + 1..located.len()).filter(|&i| {
                !processed[i] && haversine_miles(&seed_point, &located[i].1) <= max_radius
            }))
            .collect();
        for &i in &members {
            processed[i] = true;
        }

        if members.len() >= config.min_size.max(1) {
            let points: Vec<Coordinate> = members.iter().map(|&i| located[i].1).collect();
            let center = centroid(points.iter()).unwrap_or(seed_point);
            let radius = points
                .iter()
                .map(|p| haversine_miles(&center, p))
                .fold(0.0, f64::max);
            let density = if radius > 0.0 {
                members.len() as f64 / (PI * radius * radius)
            } else {
                members.len() as f64
            };
            result.clusters.push(GeographicCluster {
                id: format!("cluster-{}", result.clusters.len() + 1),
                center,
                job_ids: members.iter().map(|&i| located[i].0.id.clone()).collect(),
                radius_miles: radius,
                density,
            });
        } else {
            for &i in &members {
                result.clusters.push(singleton(result.clusters.len() + 1, located[i].0, located[i].1));
            }
        }
    }

    debug!(
        "clustered {} jobs into {} clusters ({} skipped)",
        located.len(),
        result.clusters.len(),
        result.skipped_job_ids.len()
    );
    result
}

fn singleton(n: usize, job: &Job, point: Coordinate) -> GeographicCluster {
    GeographicCluster {
        id: format!("cluster-{n}"),
        center: point,
        job_ids: vec![job.id.clone()],
        radius_miles: 0.0,
        density: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn job(id: &str, lat: f64, lon: f64) -> Job {
        Job::new(id, "addr", NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()).with_coordinate(lat, lon)
    }

    #[test]
    fn test_every_located_job_in_exactly_one_cluster() {
        let jobs = vec![
            job("A", 40.70, -74.00),
            job("B", 40.72, -74.02),
            job("C", 41.50, -73.00), // ~60 mi away
            job("D", 40.71, -74.01),
            Job::new("E", "no coords", NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()),
        ];
        let result = cluster_jobs(&jobs, &ClusterConfig::default());

        let mut seen = HashSet::new();
        for c in &result.clusters {
            for id in &c.job_ids {
                assert!(seen.insert(id.clone()), "{id} appears twice");
            }
        }
        assert_eq!(seen.len(), 4);
        assert_eq!(result.skipped_job_ids, vec!["E".to_string()]);
    }

    #[test]
    fn test_cluster_geometry() {
        let jobs = vec![job("A", 40.70, -74.00), job("B", 40.72, -74.00)];
        let result = cluster_jobs(&jobs, &ClusterConfig::default());

        assert_eq!(result.clusters.len(), 1);
        let c = &result.clusters[0];
        assert_eq!(c.job_ids, vec!["A".to_string(), "B".to_string()]);
        assert!((c.center.latitude - 40.71).abs() < 1e-10);
        assert!(c.radius_miles > 0.0);
        let expected = 2.0 / (PI * c.radius_miles * c.radius_miles);
        assert!((c.density - expected).abs() < 1e-10);
    }

    #[test]
    fn test_sub_minimum_groups_become_singletons() {
        let jobs = vec![job("A", 40.70, -74.00), job("B", 40.71, -74.00)];
        let config = ClusterConfig::default().with_min_size(3);
        let result = cluster_jobs(&jobs, &config);

        assert_eq!(result.clusters.len(), 2);
        for c in &result.clusters {
            assert!(c.is_singleton());
            assert_eq!(c.radius_miles, 0.0);
            assert_eq!(c.density, 1.0);
        }
    }

    #[test]
    fn test_radius_measured_from_seed() {
        // A-B 20 mi, B-C 20 mi, A-C 40 mi: C is not pulled in through B.
        let jobs = vec![
            job("A", 40.0, -74.0),
            job("B", 40.29, -74.0),
            job("C", 40.58, -74.0),
        ];
        let result = cluster_jobs(&jobs, &ClusterConfig::default());

        assert_eq!(result.clusters.len(), 2);
        assert_eq!(result.clusters[0].job_ids, vec!["A".to_string(), "B".to_string()]);
        assert!(result.clusters[1].is_singleton());
        assert_eq!(result.clusters[1].job_ids, vec!["C".to_string()]);
    }

    #[test]
    fn test_co_located_cluster_density() {
        let jobs = vec![job("A", 40.0, -74.0), job("B", 40.0, -74.0)];
        let result = cluster_jobs(&jobs, &ClusterConfig::default());
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].radius_miles, 0.0);
        assert_eq!(result.clusters[0].density, 2.0);
    }

    #[test]
    fn test_negative_radius_keeps_every_job() {
        let jobs = vec![job("A", 40.70, -74.00), job("B", 40.71, -74.00)];
        let config: ClusterConfig = serde_json::from_str(r#"{ "max_radius_miles": -1.0 }"#).unwrap();
        assert_eq!(config.radius(), 0.0);

        let result = cluster_jobs(&jobs, &config);
        assert_eq!(result.clusters.len(), 2);
        assert!(result.clusters.iter().all(|c| c.is_singleton()));
        assert!(result.skipped_job_ids.is_empty());
    }

    #[test]
    fn test_with_max_radius_clamps() {
        assert_eq!(ClusterConfig::default().with_max_radius(-5.0).max_radius_miles, 0.0);
        assert_eq!(ClusterConfig::default().with_max_radius(f64::NAN).radius(), 0.0);
    }

    #[test]
    fn test_empty_input() {
        let result = cluster_jobs(&[], &ClusterConfig::default());
        assert!(result.clusters.is_empty());
        assert!(result.skipped_job_ids.is_empty());
    }
}
