//! Collaborator interfaces the match engine reads from.
//!
//! Storage, ownership scoping and contact history all live behind these
//! traits; the engine never writes through them.

use async_trait::async_trait;
use thiserror::Error;
use crate::models::{CandidateKind, CandidateSnapshot, MatchingMode, SearchCriteria};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Infrastructure failure inside a collaborator
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{collaborator} unavailable: {source}")]
    Unavailable {
        collaborator: &'static str,
        #[source]
        source: BoxError,
    },
}

impl RepositoryError {
    pub fn unavailable(collaborator: &'static str, source: impl Into<BoxError>) -> Self {
        RepositoryError::Unavailable {
            collaborator,
            source: source.into(),
        }
    }
}

/// Source of candidates, already scoped to the requesting agent
#[async_trait]
pub trait CandidateRepository: Send + Sync {
    /// Candidates for `mode`: properties for client/custom modes, clients for property mode
    async fn fetch_candidates(
        &self,
        agent_id: &str,
        mode: &MatchingMode,
        criteria: &SearchCriteria,
    ) -> Result<Vec<CandidateSnapshot>, RepositoryError>;

    /// A single property owned by `agent_id`, used to derive reverse-match criteria
    async fn find_property(
        &self,
        agent_id: &str,
        property_id: &str,
    ) -> Result<Option<CandidateSnapshot>, RepositoryError>;
}

#[async_trait]
pub trait ClientCriteriaProvider: Send + Sync {
    /// `None` when the client does not exist
    async fn get_search_criteria(
        &self,
        client_id: &str,
    ) -> Result<Option<SearchCriteria>, RepositoryError>;
}

/// Per-agent history; properties and clients keep separate id spaces
#[async_trait]
pub trait ContactHistoryProvider: Send + Sync {
    async fn was_contacted(
        &self,
        agent_id: &str,
        kind: CandidateKind,
        candidate_id: &str,
    ) -> Result<bool, RepositoryError>;

    async fn view_count(
        &self,
        agent_id: &str,
        kind: CandidateKind,
        candidate_id: &str,
    ) -> Result<u32, RepositoryError>;
}
