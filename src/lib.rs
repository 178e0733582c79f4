//! Estate Match - property/client matching engine for the real-estate CRM
//!
//! Ranks properties for a client's search criteria (or an ad-hoc criteria
//! set), and clients for a property, using a weighted multi-category score
//! with deterministic ordering.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{MatchError, Matcher, NormalizedRequest, Scorer, ScoringFlags, ScoringPolicy};
pub use models::{
    CandidateKind, CandidateSnapshot, MatchRequest, MatchResponse, MatchResult, ScoreBreakdown,
    ScoringWeights, SearchCriteria, SortBy, SortDirection,
};
pub use services::{
    CandidateRepository, ClientCriteriaProvider, ContactHistoryProvider, RepositoryError,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let breakdown = Scorer::new(ScoringWeights::default(), ScoringPolicy::default()).score(
            &SearchCriteria::default(),
            &CandidateSnapshot::new("p1", CandidateKind::Property),
            &ScoringFlags::default(),
        );
        assert_eq!(breakdown.aggregate, 100);
    }
}
