use validator::Validate;
use crate::core::error::MatchError;
use crate::models::{MatchRequest, MatchingMode, ScoringWeights, SortBy, SortDirection};

/// Request flags that change how individual categories are scored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringFlags {
    pub exact_location_match: bool,
    pub allow_budget_flexibility: bool,
    pub allow_feature_flexibility: bool,
}

impl Default for ScoringFlags {
    fn default() -> Self {
        Self {
            exact_location_match: false,
            allow_budget_flexibility: true,
            allow_feature_flexibility: true,
        }
    }
}

/// A validated request with a single matching mode and unit-sum weights
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRequest {
    pub mode: MatchingMode,
    pub match_threshold: u8,
    pub max_results: usize,
    pub flags: ScoringFlags,
    pub include_contacted: bool,
    pub include_unavailable: bool,
    pub weights: ScoringWeights,
    pub sort_by: SortBy,
    pub sort_direction: SortDirection,
}

/// Validate a request and normalize its weights.
///
/// `default_weights` replaces an all-zero or absent weight vector.
/// Out-of-range threshold and result limits are rejected, never clamped.
pub fn normalize(
    request: MatchRequest,
    default_weights: ScoringWeights,
) -> Result<NormalizedRequest, MatchError> {
    request.validate()?;

    let mode = resolve_mode(&request)?;
    let weights = normalize_weights(&request, default_weights)?;

    Ok(NormalizedRequest {
        mode,
        // Both ranges were checked by `validate` above
        match_threshold: request.match_threshold as u8,
        max_results: request.max_results as usize,
        flags: ScoringFlags {
            exact_location_match: request.exact_location_match,
            allow_budget_flexibility: request.allow_budget_flexibility,
            allow_feature_flexibility: request.allow_feature_flexibility,
        },
        include_contacted: request.include_contacted,
        include_unavailable: request.include_unavailable,
        weights,
        sort_by: request.sort_by,
        sort_direction: request.sort_direction,
    })
}

fn resolve_mode(request: &MatchRequest) -> Result<MatchingMode, MatchError> {
    let client_id = non_blank(request.client_id.as_deref());
    let property_id = non_blank(request.property_id.as_deref());

    match (client_id, property_id, &request.custom_criteria) {
        (Some(id), None, None) => Ok(MatchingMode::Client { client_id: id.to_string() }),
        (None, Some(id), None) => Ok(MatchingMode::Property { property_id: id.to_string() }),
        (None, None, Some(criteria)) => Ok(MatchingMode::Custom(criteria.clone())),
        (None, None, None) => Err(MatchError::Validation(
            "one of clientId, propertyId or customCriteria is required".to_string(),
        )),
        _ => Err(MatchError::Validation(
            "only one of clientId, propertyId or customCriteria may be set".to_string(),
        )),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn normalize_weights(
    request: &MatchRequest,
    default_weights: ScoringWeights,
) -> Result<ScoringWeights, MatchError> {
    let named = [
        ("priceWeight", request.price_weight),
        ("locationWeight", request.location_weight),
        ("areaWeight", request.area_weight),
        ("roomWeight", request.room_weight),
        ("featureWeight", request.feature_weight),
    ];

    for (name, weight) in named {
        if let Some(w) = weight {
            if !w.is_finite() || w < 0.0 {
                return Err(MatchError::Validation(format!(
                    "{} must be a non-negative number, got {}",
                    name, w
                )));
            }
        }
    }

    let raw = ScoringWeights {
        price: request.price_weight.unwrap_or(0.0),
        location: request.location_weight.unwrap_or(0.0),
        area: request.area_weight.unwrap_or(0.0),
        room: request.room_weight.unwrap_or(0.0),
        feature: request.feature_weight.unwrap_or(0.0),
    };

    Ok(raw.normalized(default_weights))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchCriteria;

    fn defaults() -> ScoringWeights {
        ScoringWeights::default()
    }

    #[test]
    fn test_single_mode_accepted() {
        let normalized = normalize(MatchRequest::for_client("c1"), defaults()).unwrap();
        assert_eq!(normalized.mode, MatchingMode::Client { client_id: "c1".to_string() });
        assert_eq!(normalized.match_threshold, 70);
        assert_eq!(normalized.max_results, 50);
        assert!(normalized.include_contacted);
        assert!(!normalized.include_unavailable);
    }

    #[test]
    fn test_no_mode_rejected() {
        let mut request = MatchRequest::for_client("c1");
        request.client_id = None;
        assert!(matches!(normalize(request, defaults()), Err(MatchError::Validation(_))));
    }

    #[test]
    fn test_blank_id_counts_as_unset() {
        let request = MatchRequest::for_client("   ");
        assert!(matches!(normalize(request, defaults()), Err(MatchError::Validation(_))));
    }

    #[test]
    fn test_multiple_modes_rejected() {
        let mut request = MatchRequest::for_client("c1");
        request.property_id = Some("p1".to_string());
        assert!(matches!(normalize(request, defaults()), Err(MatchError::Validation(_))));

        let mut request = MatchRequest::for_property("p1");
        request.custom_criteria = Some(SearchCriteria::default());
        assert!(matches!(normalize(request, defaults()), Err(MatchError::Validation(_))));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let mut request = MatchRequest::for_client("c1");
        request.match_threshold = 101;
        assert!(matches!(normalize(request, defaults()), Err(MatchError::Validation(_))));

        let mut request = MatchRequest::for_client("c1");
        request.match_threshold = -1;
        assert!(matches!(normalize(request, defaults()), Err(MatchError::Validation(_))));
    }

    #[test]
    fn test_max_results_out_of_range_rejected() {
        let mut request = MatchRequest::for_client("c1");
        request.max_results = 0;
        assert!(normalize(request, defaults()).is_err());

        let mut request = MatchRequest::for_client("c1");
        request.max_results = 501;
        assert!(normalize(request, defaults()).is_err());

        let mut request = MatchRequest::for_client("c1");
        request.max_results = 500;
        assert!(normalize(request, defaults()).is_ok());
    }

    #[test]
    fn test_absent_weights_use_defaults() {
        let normalized = normalize(MatchRequest::for_client("c1"), defaults()).unwrap();
        assert_eq!(normalized.weights, ScoringWeights::default());
    }

    #[test]
    fn test_weights_normalized_to_unit_sum() {
        let mut request = MatchRequest::for_client("c1");
        request.price_weight = Some(3.0);
        request.location_weight = Some(1.0);
        request.feature_weight = Some(1.0);

        let weights = normalize(request, defaults()).unwrap().weights;
        assert!((weights.sum() - 1.0).abs() < 1e-6);
        assert!((weights.price - 0.6).abs() < 1e-9);
        assert_eq!(weights.area, 0.0);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut request = MatchRequest::for_client("c1");
        request.room_weight = Some(-0.5);
        assert!(matches!(normalize(request, defaults()), Err(MatchError::Validation(_))));
    }
}
