use crate::core::error::MatchError;
use crate::models::{CandidateSnapshot, MatchingMode, SearchCriteria};
use crate::services::ports::{CandidateRepository, ClientCriteriaProvider};

/// Half-width of the budget window built around a property's price
/// when matching in reverse
pub const REVERSE_BUDGET_WINDOW: f64 = 0.10;

/// Turns a matching mode into a concrete criteria value for one run
pub struct CriteriaResolver<'a> {
    criteria_provider: &'a dyn ClientCriteriaProvider,
    repository: &'a dyn CandidateRepository,
}

impl<'a> CriteriaResolver<'a> {
    pub fn new(
        criteria_provider: &'a dyn ClientCriteriaProvider,
        repository: &'a dyn CandidateRepository,
    ) -> Self {
        Self {
            criteria_provider,
            repository,
        }
    }

    pub async fn resolve(
        &self,
        agent_id: &str,
        mode: &MatchingMode,
    ) -> Result<SearchCriteria, MatchError> {
        match mode {
            MatchingMode::Client { client_id } => self
                .criteria_provider
                .get_search_criteria(client_id)
                .await?
                .ok_or_else(|| MatchError::NotFound(format!("client {}", client_id))),
            MatchingMode::Property { property_id } => {
                let property = self
                    .repository
                    .find_property(agent_id, property_id)
                    .await?
                    .ok_or_else(|| MatchError::NotFound(format!("property {}", property_id)))?;
                Ok(derive_from_property(&property))
            }
            MatchingMode::Custom(criteria) => Ok(criteria.clone()),
        }
    }
}

/// Implicit criteria for reverse matching.
///
/// The property's price becomes the centre of a ±10% budget window, its
/// area and rooms become point targets and its city/postal code become the
/// preferred locations. Required features stay empty so clients are not
/// scored against amenities they never asked for.
pub fn derive_from_property(property: &CandidateSnapshot) -> SearchCriteria {
    let (min_budget, max_budget) = match property.price {
        Some(price) => (
            Some(price * (1.0 - REVERSE_BUDGET_WINDOW)),
            Some(price * (1.0 + REVERSE_BUDGET_WINDOW)),
        ),
        None => (None, None),
    };

    SearchCriteria {
        min_area_sqm: property.living_area_sqm,
        max_area_sqm: property.living_area_sqm,
        min_rooms: property.rooms,
        max_rooms: property.rooms,
        min_budget,
        max_budget,
        preferred_locations: property
            .city
            .iter()
            .chain(property.postal_code.iter())
            .cloned()
            .collect(),
        preferred_regions: property.state.iter().cloned().collect(),
        property_types: property.property_types.clone(),
        listing_types: property.listing_types.clone(),
        required_features: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateKind;

    #[test]
    fn test_derive_from_property() {
        let mut property = CandidateSnapshot::new("p1", CandidateKind::Property);
        property.price = Some(300_000.0);
        property.living_area_sqm = Some(85.0);
        property.rooms = Some(3.0);
        property.city = Some("Munich".to_string());
        property.postal_code = Some("80331".to_string());
        property.state = Some("Bavaria".to_string());
        property.features = ["garage".to_string()].into();
        property.property_types = ["apartment".to_string()].into();

        let criteria = derive_from_property(&property);

        assert!((criteria.min_budget.unwrap() - 270_000.0).abs() < 1e-6);
        assert!((criteria.max_budget.unwrap() - 330_000.0).abs() < 1e-6);
        assert_eq!(criteria.min_area_sqm, Some(85.0));
        assert_eq!(criteria.max_area_sqm, Some(85.0));
        assert_eq!(criteria.min_rooms, Some(3.0));
        assert!(criteria.preferred_locations.contains("Munich"));
        assert!(criteria.preferred_locations.contains("80331"));
        assert!(criteria.preferred_regions.contains("Bavaria"));
        assert!(criteria.required_features.is_empty());
        assert!(criteria.property_types.contains("apartment"));
    }

    #[test]
    fn test_derive_without_price_leaves_budget_open() {
        let property = CandidateSnapshot::new("p1", CandidateKind::Property);
        let criteria = derive_from_property(&property);
        assert_eq!(criteria.min_budget, None);
        assert_eq!(criteria.max_budget, None);
        assert!(criteria.preferred_locations.is_empty());
    }
}
