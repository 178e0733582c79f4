use serde::{Deserialize, Serialize};
use crate::models::domain::MatchResult;

/// Response for the match endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResponse {
    pub matches: Vec<MatchResult>,
    /// Count after filtering, before truncation to `maxResults`
    #[serde(rename = "totalMatches")]
    pub total_matches: usize,
    #[serde(rename = "returnedMatches")]
    pub returned_matches: usize,
    #[serde(rename = "matchThreshold")]
    pub match_threshold: u8,
    #[serde(rename = "executionTimeMs")]
    pub execution_time_ms: u64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}
