use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::SearchCriteria;

/// Request to rank candidates
///
/// Exactly one of `clientId`, `propertyId` and `customCriteria` must be set.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchRequest {
    #[serde(rename = "clientId", default)]
    pub client_id: Option<String>,
    #[serde(rename = "propertyId", default)]
    pub property_id: Option<String>,
    #[serde(rename = "customCriteria", default)]
    pub custom_criteria: Option<SearchCriteria>,
    #[validate(range(min = 0, max = 100))]
    #[serde(rename = "matchThreshold", default = "default_threshold")]
    pub match_threshold: i32,
    #[validate(range(min = 1, max = 500))]
    #[serde(rename = "maxResults", default = "default_max_results")]
    pub max_results: i32,
    #[serde(rename = "exactLocationMatch", default)]
    pub exact_location_match: bool,
    #[serde(rename = "allowBudgetFlexibility", default = "default_true")]
    pub allow_budget_flexibility: bool,
    #[serde(rename = "allowFeatureFlexibility", default = "default_true")]
    pub allow_feature_flexibility: bool,
    #[serde(rename = "includeContacted", default = "default_true")]
    pub include_contacted: bool,
    #[serde(rename = "includeUnavailable", default)]
    pub include_unavailable: bool,
    #[serde(rename = "priceWeight", default)]
    pub price_weight: Option<f64>,
    #[serde(rename = "locationWeight", default)]
    pub location_weight: Option<f64>,
    #[serde(rename = "areaWeight", default)]
    pub area_weight: Option<f64>,
    #[serde(rename = "roomWeight", default)]
    pub room_weight: Option<f64>,
    #[serde(rename = "featureWeight", default)]
    pub feature_weight: Option<f64>,
    #[serde(rename = "sortBy", default)]
    pub sort_by: SortBy,
    #[serde(rename = "sortDirection", default)]
    pub sort_direction: SortDirection,
}

fn default_threshold() -> i32 {
    70
}

fn default_max_results() -> i32 {
    50
}

fn default_true() -> bool {
    true
}

impl MatchRequest {
    fn with_defaults() -> Self {
        Self {
            client_id: None,
            property_id: None,
            custom_criteria: None,
            match_threshold: default_threshold(),
            max_results: default_max_results(),
            exact_location_match: false,
            allow_budget_flexibility: true,
            allow_feature_flexibility: true,
            include_contacted: true,
            include_unavailable: false,
            price_weight: None,
            location_weight: None,
            area_weight: None,
            room_weight: None,
            feature_weight: None,
            sort_by: SortBy::default(),
            sort_direction: SortDirection::default(),
        }
    }

    /// Properties for a stored client profile, all options at their defaults
    pub fn for_client(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..Self::with_defaults()
        }
    }

    /// Interested clients for a property, all options at their defaults
    pub fn for_property(property_id: impl Into<String>) -> Self {
        Self {
            property_id: Some(property_id.into()),
            ..Self::with_defaults()
        }
    }

    /// Properties for ad-hoc criteria, all options at their defaults
    pub fn for_criteria(criteria: SearchCriteria) -> Self {
        Self {
            custom_criteria: Some(criteria),
            ..Self::with_defaults()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
    #[default]
    #[serde(rename = "matchScore")]
    MatchScore,
    #[serde(rename = "price")]
    Price,
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "livingAreaSqm")]
    LivingAreaSqm,
    #[serde(rename = "rooms")]
    Rooms,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    #[default]
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}
