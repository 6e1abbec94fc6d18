//! Engine-wide configuration.
//!
//! Aggregates the per-component settings so a host service can load one
//! JSON document. Every field is optional on the wire and falls back to the
//! component default.
//!
//! ```
//! use u_fieldops::config::FieldOpsConfig;
//!
//! let config = FieldOpsConfig::from_json_str(
//!     r#"{ "optimizer": { "population_size": 20 }, "resolver": { "max_rounds": 3 } }"#,
//! ).unwrap();
//! assert_eq!(config.optimizer.population_size, 20);
//! assert_eq!(config.optimizer.max_generations, 100);
//! assert_eq!(config.resolver.max_rounds, 3);
//! assert_eq!(config.cluster.max_radius_miles, 25.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::cluster::ClusterConfig;
use crate::conflict::ResolverConfig;
use crate::error::Result;
use crate::ga::RouteGaConfig;
use crate::routing::MultiStopConstraints;

/// Default capacity of the shared distance cache, in entries.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldOpsConfig {
    pub cluster: ClusterConfig,
    /// Route GA settings.
    pub optimizer: RouteGaConfig,
    /// Stop filters applied to every per-team route.
    pub routing: MultiStopConstraints,
    pub resolver: ResolverConfig,
    /// Distance cache size. 0 disables caching.
    pub cache_capacity: usize,
    /// Base seed for per-team route randomness.
    pub seed: u64,
}

impl Default for FieldOpsConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            optimizer: RouteGaConfig::default(),
            routing: MultiStopConstraints::default(),
            resolver: ResolverConfig::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            seed: 42,
        }
    }
}

impl FieldOpsConfig {
    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_cluster(mut self, cluster: ClusterConfig) -> Self {
        self.cluster = cluster;
        self
    }

    pub fn with_optimizer(mut self, optimizer: RouteGaConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_routing(mut self, routing: MultiStopConstraints) -> Self {
        self.routing = routing;
        self
    }

    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_cache_capacity(mut self, entries: usize) -> Self {
        self.cache_capacity = entries;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
