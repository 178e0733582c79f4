// Core algorithm exports
pub mod criteria;
pub mod error;
pub mod matcher;
pub mod ranking;
pub mod reasons;
pub mod scoring;
pub mod validation;

pub use criteria::{derive_from_property, CriteriaResolver};
pub use error::MatchError;
pub use matcher::{assemble, Matcher};
pub use ranking::rank;
pub use reasons::explain;
pub use scoring::{range_decay, Scorer, ScoringPolicy};
pub use validation::{normalize, NormalizedRequest, ScoringFlags};
