// Service exports
pub mod cache;
pub mod ports;
pub mod postgres;

pub use cache::{CacheError, CacheKey, CacheManager, CachedCriteriaProvider};
pub use ports::{
    CandidateRepository, ClientCriteriaProvider, ContactHistoryProvider, RepositoryError,
};
pub use postgres::{PostgresClient, PostgresError};
