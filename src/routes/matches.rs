use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse, Responder, ResponseError};
use std::sync::Arc;
use crate::core::{MatchError, Matcher};
use crate::models::{ErrorResponse, HealthResponse, MatchRequest};
use crate::services::PostgresClient;

/// Header carrying the requesting agent; authentication happens upstream
pub const AGENT_HEADER: &str = "X-Agent-Id";

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub matcher: Matcher,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches", web::post().to(find_matches));
}

impl ResponseError for MatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            MatchError::Validation(_) => StatusCode::BAD_REQUEST,
            MatchError::NotFound(_) => StatusCode::NOT_FOUND,
            MatchError::Repository(_) | MatchError::Scoring(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            MatchError::Validation(_) => "validation_failed",
            MatchError::NotFound(_) => "not_found",
            MatchError::Repository(_) => "repository_unavailable",
            MatchError::Scoring(_) => "internal_error",
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error.to_string(),
            message: self.to_string(),
            status_code: self.status_code().as_u16(),
        })
    }
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Find matches endpoint
///
/// POST /api/v1/matches
///
/// Request body (exactly one of clientId, propertyId, customCriteria):
/// ```json
/// {
///   "clientId": "string",
///   "matchThreshold": 70,
///   "maxResults": 50,
///   "sortBy": "matchScore",
///   "sortDirection": "DESC"
/// }
/// ```
async fn find_matches(
    state: web::Data<AppState>,
    req: web::Json<MatchRequest>,
    http_req: HttpRequest,
) -> HttpResponse {
    let Some(agent_id) = agent_id(&http_req) else {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "missing_agent".to_string(),
            message: format!("{} header is required", AGENT_HEADER),
            status_code: 400,
        });
    };

    tracing::info!("Finding matches for agent: {}", agent_id);

    match state.matcher.find_matches(&agent_id, req.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            match &e {
                MatchError::Repository(_) | MatchError::Scoring(_) => {
                    tracing::error!("Match run failed for {}: {}", agent_id, e)
                }
                _ => tracing::info!("Match request rejected for {}: {}", agent_id, e),
            }
            e.error_response()
        }
    }
}

fn agent_id(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(AGENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use crate::services::RepositoryError;

    #[test]
    fn test_health_check_response() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            timestamp: chrono::Utc::now(),
        };

        assert_eq!(response.status, "healthy");
    }

    #[test]
    fn test_error_status_codes() {
        let invalid = MatchError::Validation("x".into());
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
        let missing = MatchError::NotFound("client c1".into());
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        let repo = MatchError::Repository(RepositoryError::unavailable("postgres", "down"));
        assert_eq!(repo.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_scoring_task_failure_is_internal() {
        let join_error = tokio::task::spawn_blocking(|| panic!("scorer crashed"))
            .await
            .unwrap_err();
        let error = MatchError::from(join_error);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_agent_header_extraction() {
        let req = TestRequest::default()
            .insert_header((AGENT_HEADER, " agent-7 "))
            .to_http_request();
        assert_eq!(agent_id(&req).as_deref(), Some("agent-7"));

        let req = TestRequest::default().to_http_request();
        assert!(agent_id(&req).is_none());
    }
}
