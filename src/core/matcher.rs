use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;
use crate::core::{
    criteria::CriteriaResolver,
    error::MatchError,
    ranking::rank,
    reasons::explain,
    scoring::{Scorer, ScoringPolicy},
    validation::{normalize, NormalizedRequest},
};
use crate::models::{
    CandidateSnapshot, MatchRequest, MatchResponse, MatchResult, ScoreBreakdown, ScoringWeights,
};
use crate::services::ports::{CandidateRepository, ClientCriteriaProvider, ContactHistoryProvider};

/// Candidate count at which scoring switches to the rayon pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

/// History lookups in flight at once during a run
pub const DEFAULT_HISTORY_CONCURRENCY: usize = 8;

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Validate the request and normalize weights
/// 2. Resolve the search criteria (stored, ad hoc or derived from a property)
/// 3. Fetch candidates from the repository
/// 4. Score every candidate
/// 5. Keep candidates above the threshold, attach contact history
/// 6. Filter, sort and truncate
/// 7. Explain the returned results and assemble the response
#[derive(Clone)]
pub struct Matcher {
    repository: Arc<dyn CandidateRepository>,
    criteria_provider: Arc<dyn ClientCriteriaProvider>,
    history: Arc<dyn ContactHistoryProvider>,
    default_weights: ScoringWeights,
    policy: ScoringPolicy,
    parallel_threshold: usize,
    history_concurrency: usize,
}

impl Matcher {
    pub fn new(
        repository: Arc<dyn CandidateRepository>,
        criteria_provider: Arc<dyn ClientCriteriaProvider>,
        history: Arc<dyn ContactHistoryProvider>,
    ) -> Self {
        Self {
            repository,
            criteria_provider,
            history,
            default_weights: ScoringWeights::default(),
            policy: ScoringPolicy::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            history_concurrency: DEFAULT_HISTORY_CONCURRENCY,
        }
    }

    /// Weights used when a request supplies none
    pub fn with_default_weights(mut self, weights: ScoringWeights) -> Self {
        self.default_weights = weights;
        self
    }

    pub fn with_policy(mut self, policy: ScoringPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold.max(1);
        self
    }

    pub fn with_history_concurrency(mut self, limit: usize) -> Self {
        self.history_concurrency = limit.max(1);
        self
    }

    /// Rank candidates for `request` on behalf of `agent_id`.
    ///
    /// Validation happens before any collaborator is called. Collaborator
    /// failures are returned as-is without retry.
    pub async fn find_matches(
        &self,
        agent_id: &str,
        request: MatchRequest,
    ) -> Result<MatchResponse, MatchError> {
        let normalized = normalize(request, self.default_weights)?;

        let span = tracing::info_span!(
            "match_run",
            run_id = %Uuid::new_v4(),
            agent_id = %agent_id,
            mode = normalized.mode.label(),
        );

        self.run(agent_id, normalized).instrument(span).await
    }

    async fn run(
        &self,
        agent_id: &str,
        request: NormalizedRequest,
    ) -> Result<MatchResponse, MatchError> {
        let resolver = CriteriaResolver::new(
            self.criteria_provider.as_ref(),
            self.repository.as_ref(),
        );
        let criteria = resolver.resolve(agent_id, &request.mode).await?;

        let started = Instant::now();

        let candidates = self
            .repository
            .fetch_candidates(agent_id, &request.mode, &criteria)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch candidates for {}: {}", agent_id, e);
                e
            })?;
        let candidate_count = candidates.len();

        let scorer = Scorer::new(request.weights, self.policy);
        let scored = if candidate_count >= self.parallel_threshold {
            // Keep the rayon fan-out off the async worker threads
            let criteria = criteria.clone();
            let flags = request.flags;
            let threshold = self.parallel_threshold;
            tokio::task::spawn_blocking(move || {
                scorer.score_all(&criteria, candidates, &flags, threshold)
            })
            .await?
        } else {
            scorer.score_all(&criteria, candidates, &request.flags, self.parallel_threshold)
        };

        // Threshold and availability need no history, so they go first
        let shortlisted: Vec<MatchResult> = scored
            .into_iter()
            .filter(|(candidate, breakdown)| {
                breakdown.aggregate >= request.match_threshold
                    && (request.include_unavailable || candidate.available)
            })
            .map(|(candidate, breakdown)| pending_result(candidate, breakdown))
            .collect();

        tracing::debug!(
            "Scored {} candidates, {} above threshold {}",
            candidate_count,
            shortlisted.len(),
            request.match_threshold
        );

        // Without the contacted filter, history only matters for what is returned
        let (ranked, total_matches) = if request.include_contacted {
            let (ranked, total_matches) = rank(shortlisted, &request);
            (self.attach_history(agent_id, ranked).await?, total_matches)
        } else {
            rank(self.attach_history(agent_id, shortlisted).await?, &request)
        };

        let ranked = ranked
            .into_iter()
            .map(|mut result| {
                let (match_reasons, mismatch_reasons) =
                    explain(&result.breakdown, &criteria, &result.candidate);
                result.match_reasons = match_reasons;
                result.mismatch_reasons = mismatch_reasons;
                result
            })
            .collect();

        let response = assemble(ranked, total_matches, started.elapsed(), &request);

        tracing::info!(
            "Returning {} of {} matches (from {} candidates) in {}ms",
            response.returned_matches,
            response.total_matches,
            candidate_count,
            response.execution_time_ms
        );

        Ok(response)
    }

    /// Contact flag and view count for each result, at most
    /// `history_concurrency` lookups in flight, input order kept.
    async fn attach_history(
        &self,
        agent_id: &str,
        results: Vec<MatchResult>,
    ) -> Result<Vec<MatchResult>, MatchError> {
        stream::iter(results)
            .map(|mut result| async move {
                let kind = result.candidate.kind;
                let id = result.candidate.id.as_str();
                result.previously_contacted = self.history.was_contacted(agent_id, kind, id).await?;
                result.view_count = self.history.view_count(agent_id, kind, id).await?;
                Ok::<_, MatchError>(result)
            })
            .buffered(self.history_concurrency)
            .try_collect()
            .await
            .map_err(|e| {
                tracing::error!("Failed to read contact history for {}: {}", agent_id, e);
                e
            })
    }
}

fn pending_result(candidate: CandidateSnapshot, breakdown: ScoreBreakdown) -> MatchResult {
    MatchResult {
        match_score: breakdown.aggregate,
        breakdown,
        match_reasons: Vec::new(),
        mismatch_reasons: Vec::new(),
        previously_contacted: false,
        view_count: 0,
        candidate,
    }
}

/// Final response from ranked results and the measured pipeline duration
pub fn assemble(
    ranked: Vec<MatchResult>,
    total_matches: usize,
    elapsed: Duration,
    request: &NormalizedRequest,
) -> MatchResponse {
    MatchResponse {
        returned_matches: ranked.len(),
        matches: ranked,
        total_matches,
        match_threshold: request.match_threshold,
        execution_time_ms: elapsed.as_millis() as u64,
    }
}
