// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CandidateKind, CandidateSnapshot, Client, ListingType, MatchResult, MatchingMode, Property,
    PropertyStatus, PropertyType, ScoreBreakdown, ScoringWeights, SearchCriteria,
};
pub use requests::{MatchRequest, SortBy, SortDirection};
pub use responses::{ErrorResponse, HealthResponse, MatchResponse};
