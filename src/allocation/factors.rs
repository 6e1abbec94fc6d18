//! Built-in scoring factors.
//!
//! All factors are multipliers applied to the home-to-job distance; lower
//! products win.

use super::{Candidate, FactorKind, ScoringFactor};

/// Region match bonus.
///
/// Applies when the job's region equals the team's region or one of its
/// subregions (case-insensitive).
#[derive(Debug, Clone, Copy)]
pub struct RegionMatch {
    pub bonus: f64,
}

impl Default for RegionMatch {
    fn default() -> Self {
        Self { bonus: 0.8 }
    }
}

impl ScoringFactor for RegionMatch {
    fn name(&self) -> &'static str {
        "region"
    }

    fn factor(&self, c: &Candidate<'_>) -> f64 {
        match &c.job.region {
            Some(region) if c.team.serves_region(region) => self.bonus,
            _ => 1.0,
        }
    }

    fn kind(&self) -> FactorKind {
        FactorKind::Region
    }

    fn description(&self) -> &'static str {
        "Team serves the job's region"
    }
}

/// Specialization coverage bonus.
///
/// Applies only when the job requires at least one tag and the team covers
/// all of them.
#[derive(Debug, Clone, Copy)]
pub struct SpecializationMatch {
    pub bonus: f64,
}

impl Default for SpecializationMatch {
    fn default() -> Self {
        Self { bonus: 0.9 }
    }
}

impl ScoringFactor for SpecializationMatch {
    fn name(&self) -> &'static str {
        "specialization"
    }

    fn factor(&self, c: &Candidate<'_>) -> f64 {
        if !c.required.is_empty() && c.team.covers(c.required) {
            self.bonus
        } else {
            1.0
        }
    }

    fn kind(&self) -> FactorKind {
        FactorKind::Specialization
    }

    fn description(&self) -> &'static str {
        "Team covers every required capability"
    }
}

/// Load penalty: `1 + per_job × current load`.
#[derive(Debug, Clone, Copy)]
pub struct LoadPenalty {
    pub per_job: f64,
}

impl Default for LoadPenalty {
    fn default() -> Self {
        Self { per_job: 0.1 }
    }
}

impl ScoringFactor for LoadPenalty {
    fn name(&self) -> &'static str {
        "load"
    }

    fn factor(&self, c: &Candidate<'_>) -> f64 {
        1.0 + self.per_job * f64::from(c.current_load)
    }

    fn kind(&self) -> FactorKind {
        FactorKind::Load
    }

    fn description(&self) -> &'static str {
        "Spreads work across teams"
    }
}

/// Customer-rating bonus: `1 - weight × (rating / 5)`.
///
/// Not part of the standard set; add it with
/// [`TeamScorer::with_factor`](super::TeamScorer::with_factor).
#[derive(Debug, Clone, Copy)]
pub struct RatingBonus {
    pub weight: f64,
}

impl Default for RatingBonus {
    fn default() -> Self {
        Self { weight: 0.1 }
    }
}

impl ScoringFactor for RatingBonus {
    fn name(&self) -> &'static str {
        "rating"
    }

    fn factor(&self, c: &Candidate<'_>) -> f64 {
        let rating = c.team.performance.customer_rating.clamp(0.0, 5.0);
        1.0 - self.weight * rating / 5.0
    }

    fn description(&self) -> &'static str {
        "Favors highly rated teams"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Job, PerformanceMetrics, TeamMember};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn job() -> Job {
        Job::new("J1", "x", NaiveDate::from_ymd_opt(2024, 3, 4).unwrap())
    }

    fn candidate<'a>(job: &'a Job, team: &'a TeamMember, required: &'a BTreeSet<String>, load: u32) -> Candidate<'a> {
        Candidate {
            job,
            team,
            required,
            distance_miles: 10.0,
            current_load: load,
        }
    }

    #[test]
    fn test_region_match() {
        let none = BTreeSet::new();
        let team = TeamMember::new("T1", "North").with_subregion("east");
        let f = RegionMatch::default();

        let j = job().with_region("north");
        assert!((f.factor(&candidate(&j, &team, &none, 0)) - 0.8).abs() < 1e-10);
        let j = job().with_region("East");
        assert!((f.factor(&candidate(&j, &team, &none, 0)) - 0.8).abs() < 1e-10);
        let j = job().with_region("west");
        assert_eq!(f.factor(&candidate(&j, &team, &none, 0)), 1.0);
        let j = job();
        assert_eq!(f.factor(&candidate(&j, &team, &none, 0)), 1.0);
    }

    #[test]
    fn test_specialization_match() {
        let j = job();
        let team = TeamMember::new("T1", "r").with_specialization("hvac");
        let f = SpecializationMatch::default();

        let none = BTreeSet::new();
        assert_eq!(f.factor(&candidate(&j, &team, &none, 0)), 1.0);

        let hvac: BTreeSet<String> = ["hvac".to_string()].into();
        assert!((f.factor(&candidate(&j, &team, &hvac, 0)) - 0.9).abs() < 1e-10);

        let both: BTreeSet<String> = ["hvac".to_string(), "solar".to_string()].into();
        assert_eq!(f.factor(&candidate(&j, &team, &both, 0)), 1.0);
    }

    #[test]
    fn test_load_penalty() {
        let j = job();
        let team = TeamMember::new("T1", "r");
        let none = BTreeSet::new();
        let f = LoadPenalty::default();
        assert_eq!(f.factor(&candidate(&j, &team, &none, 0)), 1.0);
        assert!((f.factor(&candidate(&j, &team, &none, 3)) - 1.3).abs() < 1e-10);
    }

    #[test]
    fn test_rating_bonus() {
        let j = job();
        let none = BTreeSet::new();
        let team = TeamMember::new("T1", "r").with_performance(PerformanceMetrics {
            customer_rating: 5.0,
            ..Default::default()
        });
        let f = RatingBonus::default();
        assert!((f.factor(&candidate(&j, &team, &none, 0)) - 0.9).abs() < 1e-10);
        assert_eq!(f.kind(), FactorKind::Custom);
    }
}
