//! Composable multiplicative team scorer.

use std::sync::Arc;

use super::factors::{LoadPenalty, RegionMatch, SpecializationMatch};
use super::{Candidate, FactorKind, ScoringFactor};
use crate::models::AssignmentScores;

/// Combines [`ScoringFactor`]s into a single score (lower = better).
///
/// # Example
/// ```
/// use u_fieldops::allocation::TeamScorer;
/// use u_fieldops::allocation::factors::RatingBonus;
///
/// let scorer = TeamScorer::standard().with_factor(RatingBonus::default());
/// assert_eq!(scorer.factor_names(), vec!["region", "specialization", "load", "rating"]);
/// ```
#[derive(Clone)]
pub struct TeamScorer {
    factors: Vec<Arc<dyn ScoringFactor>>,
}

impl TeamScorer {
    /// A scorer with no factors: score = distance.
    pub fn new() -> Self {
        Self {
            factors: Vec::new(),
        }
    }

    /// Region match, specialization coverage and load penalty with their
    /// default weights.
    pub fn standard() -> Self {
        Self::new()
            .with_factor(RegionMatch::default())
            .with_factor(SpecializationMatch::default())
            .with_factor(LoadPenalty::default())
    }

    /// Appends a factor.
    pub fn with_factor<F: ScoringFactor + 'static>(mut self, factor: F) -> Self {
        self.factors.push(Arc::new(factor));
        self
    }

    pub fn factor_names(&self) -> Vec<&'static str> {
        self.factors.iter().map(|f| f.name()).collect()
    }

    /// Scores a candidate pairing.
    pub fn score(&self, candidate: &Candidate<'_>) -> AssignmentScores {
        let mut scores = AssignmentScores {
            distance_miles: candidate.distance_miles,
            ..Default::default()
        };
        let mut total = candidate.distance_miles;
        for f in &self.factors {
            let value = f.factor(candidate);
            match f.kind() {
                FactorKind::Region => scores.region_factor *= value,
                FactorKind::Specialization => scores.specialization_factor *= value,
                FactorKind::Load => scores.load_factor *= value,
                FactorKind::Custom => {}
            }
            total *= value;
        }
        scores.total = total;
        scores
    }
}

impl Default for TeamScorer {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for TeamScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamScorer")
            .field("factors", &self.factor_names())
            .finish()
    }
}
