use rayon::prelude::*;
use std::collections::BTreeSet;
use crate::core::validation::ScoringFlags;
use crate::models::{
    CandidateKind, CandidateSnapshot, ScoreBreakdown, ScoringWeights, SearchCriteria,
};

/// Fixed scoring constants that are not exposed per request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    /// Budget decay window, as a fraction of the violated budget bound
    pub budget_flexibility: f64,
    /// Decay window for area and rooms, as a fraction of the range width
    pub size_flexibility: f64,
    /// Share of the aggregate taken by the type category
    pub type_weight: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            budget_flexibility: 0.10,
            size_flexibility: 0.10,
            type_weight: 0.10,
        }
    }
}

/// Scores candidates against one resolved criteria set.
///
/// Scoring formula:
/// aggregate = round(
///     (1 - type_weight) * (
///         price * w_price + location * w_location + area * w_area
///         + room * w_room + feature * w_feature
///     )
///     + type_weight * type
/// )
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    weights: ScoringWeights,
    policy: ScoringPolicy,
}

impl Scorer {
    /// `weights` must already be normalized to a unit sum
    pub fn new(weights: ScoringWeights, policy: ScoringPolicy) -> Self {
        Self { weights, policy }
    }

    pub fn score(
        &self,
        criteria: &SearchCriteria,
        candidate: &CandidateSnapshot,
        flags: &ScoringFlags,
    ) -> ScoreBreakdown {
        let price = price_score(criteria, candidate, flags, &self.policy);
        let location = location_score(criteria, candidate, flags);
        let area = size_score(
            candidate.living_area_sqm,
            criteria.min_area_sqm,
            criteria.max_area_sqm,
            self.policy.size_flexibility,
        );
        let room = size_score(
            candidate.rooms,
            criteria.min_rooms,
            criteria.max_rooms,
            self.policy.size_flexibility,
        );
        let feature = feature_score(criteria, candidate, flags);
        let property_type = type_score(criteria, candidate);

        let w = &self.weights;
        let weighted = w.price * price as f64
            + w.location * location as f64
            + w.area * area as f64
            + w.room * room as f64
            + w.feature * feature as f64;
        let type_weight = self.policy.type_weight.clamp(0.0, 1.0);
        let aggregate = (1.0 - type_weight) * weighted + type_weight * property_type as f64;

        ScoreBreakdown {
            price,
            location,
            area,
            room,
            feature,
            property_type,
            aggregate: to_score(aggregate),
        }
    }

    /// Score every candidate, in parallel once `parallel_threshold` is reached.
    ///
    /// Output order always matches input order.
    pub fn score_all(
        &self,
        criteria: &SearchCriteria,
        candidates: Vec<CandidateSnapshot>,
        flags: &ScoringFlags,
        parallel_threshold: usize,
    ) -> Vec<(CandidateSnapshot, ScoreBreakdown)> {
        if candidates.len() >= parallel_threshold {
            candidates
                .into_par_iter()
                .map(|candidate| {
                    let breakdown = self.score(criteria, &candidate, flags);
                    (candidate, breakdown)
                })
                .collect()
        } else {
            candidates
                .into_iter()
                .map(|candidate| {
                    let breakdown = self.score(criteria, &candidate, flags);
                    (candidate, breakdown)
                })
                .collect()
        }
    }
}

/// Clip to 0..=100 and round half away from zero
#[inline]
fn to_score(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 100.0).round() as u8
}

/// Linear decay outside `[min, max]`.
///
/// Inside the range scores 100. Outside, the score falls from 100 at the
/// boundary to 0 at `boundary ± window`; a zero window means a hard cut.
#[inline]
pub fn range_decay(
    value: f64,
    min: Option<f64>,
    max: Option<f64>,
    window_below: f64,
    window_above: f64,
) -> f64 {
    if let Some(lo) = min {
        if value < lo {
            return decay(lo - value, window_below);
        }
    }
    if let Some(hi) = max {
        if value > hi {
            return decay(value - hi, window_above);
        }
    }
    100.0
}

#[inline]
fn decay(overshoot: f64, window: f64) -> f64 {
    if window <= 0.0 || overshoot >= window {
        return 0.0;
    }
    100.0 * (1.0 - overshoot / window)
}

/// Headroom is never penalized.
///
/// A property decays above `maxBudget`. A client's budget decays below
/// `minBudget`, the floor of the window derived from the listing price.
fn price_score(
    criteria: &SearchCriteria,
    candidate: &CandidateSnapshot,
    flags: &ScoringFlags,
    policy: &ScoringPolicy,
) -> u8 {
    let Some(price) = candidate.price else {
        return 100;
    };

    let window = |bound: f64| {
        if flags.allow_budget_flexibility {
            policy.budget_flexibility * bound.abs()
        } else {
            0.0
        }
    };

    let score = match candidate.kind {
        CandidateKind::Property => match criteria.max_budget {
            Some(max) => range_decay(price, None, Some(max), 0.0, window(max)),
            None => 100.0,
        },
        CandidateKind::Client => match criteria.min_budget {
            Some(min) => range_decay(price, Some(min), None, window(min), 0.0),
            None => 100.0,
        },
    };

    to_score(score)
}

/// Symmetric decay for living area and room count
fn size_score(value: Option<f64>, min: Option<f64>, max: Option<f64>, fraction: f64) -> u8 {
    let Some(value) = value else {
        return 100;
    };

    let width = match (min, max) {
        (Some(lo), Some(hi)) if hi > lo => Some(hi - lo),
        _ => None,
    };
    // Point targets and one-sided ranges have no width; fall back to the bound itself
    let window_below = fraction * width.unwrap_or_else(|| min.map(f64::abs).unwrap_or(0.0));
    let window_above = fraction * width.unwrap_or_else(|| max.map(f64::abs).unwrap_or(0.0));

    to_score(range_decay(value, min, max, window_below, window_above))
}

fn location_score(
    criteria: &SearchCriteria,
    candidate: &CandidateSnapshot,
    flags: &ScoringFlags,
) -> u8 {
    if criteria.preferred_locations.is_empty() {
        return 100;
    }

    let places: BTreeSet<String> = [&candidate.city, &candidate.postal_code]
        .into_iter()
        .flatten()
        .chain(candidate.preferred_locations.iter())
        .map(|place| fold(place))
        .collect();
    let regions: BTreeSet<String> = candidate
        .state
        .iter()
        .chain(candidate.preferred_regions.iter())
        .map(|region| fold(region))
        .collect();

    if places.is_empty() && regions.is_empty() {
        return 100;
    }

    let preferred = folded(&criteria.preferred_locations);
    if !places.is_disjoint(&preferred) {
        return 100;
    }
    if flags.exact_location_match {
        return 0;
    }

    let preferred_regions = folded(&criteria.preferred_regions);
    let same_region = regions
        .iter()
        .any(|region| preferred.contains(region) || preferred_regions.contains(region));

    if same_region { 50 } else { 0 }
}

fn feature_score(
    criteria: &SearchCriteria,
    candidate: &CandidateSnapshot,
    flags: &ScoringFlags,
) -> u8 {
    if criteria.required_features.is_empty() {
        return 100;
    }

    let required = folded(&criteria.required_features);
    let present = folded(&candidate.features);
    let matched = required.intersection(&present).count();
    let ratio = matched as f64 / required.len() as f64;

    if flags.allow_feature_flexibility {
        to_score(ratio * 100.0)
    } else if matched == required.len() {
        100
    } else {
        0
    }
}

/// Average of the property-type and listing-type checks
fn type_score(criteria: &SearchCriteria, candidate: &CandidateSnapshot) -> u8 {
    let property = set_check(&criteria.property_types, &candidate.property_types);
    let listing = set_check(&criteria.listing_types, &candidate.listing_types);
    ((property as u16 + listing as u16) / 2) as u8
}

fn set_check(wanted: &BTreeSet<String>, offered: &BTreeSet<String>) -> u8 {
    if wanted.is_empty() || offered.is_empty() {
        return 100;
    }
    let wanted = folded(wanted);
    if offered.iter().any(|o| wanted.contains(&fold(o))) { 100 } else { 0 }
}

#[inline]
pub(crate) fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

pub(crate) fn folded(values: &BTreeSet<String>) -> BTreeSet<String> {
    values.iter().map(|v| fold(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> Scorer {
        Scorer::new(ScoringWeights::default(), ScoringPolicy::default())
    }

    fn budget(min: f64, max: f64) -> SearchCriteria {
        SearchCriteria {
            min_budget: Some(min),
            max_budget: Some(max),
            ..Default::default()
        }
    }

    fn priced(price: f64) -> CandidateSnapshot {
        let mut candidate = CandidateSnapshot::new("p", CandidateKind::Property);
        candidate.price = Some(price);
        candidate
    }

    fn score_price(criteria: &SearchCriteria, candidate: &CandidateSnapshot) -> ScoreBreakdown {
        scorer().score(criteria, candidate, &ScoringFlags::default())
    }

    fn client_budget(budget: f64) -> CandidateSnapshot {
        let mut client = CandidateSnapshot::new("c", CandidateKind::Client);
        client.price = Some(budget);
        client
    }

    #[test]
    fn test_price_within_budget() {
        let breakdown = score_price(&budget(200_000.0, 300_000.0), &priced(250_000.0));
        assert_eq!(breakdown.price, 100);
    }

    #[test]
    fn test_price_at_window_edge() {
        let breakdown = score_price(&budget(200_000.0, 300_000.0), &priced(330_000.0));
        assert_eq!(breakdown.price, 0);
    }

    #[test]
    fn test_price_window_midpoint() {
        let breakdown = score_price(&budget(200_000.0, 300_000.0), &priced(315_000.0));
        assert_eq!(breakdown.price, 50);
    }

    #[test]
    fn test_cheaper_never_penalized() {
        let flags = ScoringFlags {
            allow_budget_flexibility: false,
            ..Default::default()
        };
        let breakdown = scorer().score(&budget(200_000.0, 300_000.0), &priced(90_000.0), &flags);
        assert_eq!(breakdown.price, 100);
    }

    #[test]
    fn test_price_without_flexibility_is_hard_cut() {
        let flags = ScoringFlags {
            allow_budget_flexibility: false,
            ..Default::default()
        };
        let breakdown = scorer().score(&budget(200_000.0, 300_000.0), &priced(300_001.0), &flags);
        assert_eq!(breakdown.price, 0);
    }

    #[test]
    fn test_client_budget_below_floor_decays() {
        // Window derived from a 300k listing: floor 270k, decay window 27k
        let criteria = budget(270_000.0, 330_000.0);
        assert_eq!(score_price(&criteria, &client_budget(100_000.0)).price, 0);
        assert_eq!(score_price(&criteria, &client_budget(256_500.0)).price, 50);
        assert_eq!(score_price(&criteria, &client_budget(270_000.0)).price, 100);
    }

    #[test]
    fn test_client_budget_headroom_not_penalized() {
        let criteria = budget(270_000.0, 330_000.0);
        assert_eq!(score_price(&criteria, &client_budget(400_000.0)).price, 100);

        let flags = ScoringFlags {
            allow_budget_flexibility: false,
            ..Default::default()
        };
        assert_eq!(scorer().score(&criteria, &client_budget(269_999.0), &flags).price, 0);
    }

    #[test]
    fn test_client_location_set_matches_any_place() {
        let criteria = SearchCriteria {
            preferred_locations: ["Munich".to_string()].into(),
            preferred_regions: ["Bavaria".to_string()].into(),
            ..Default::default()
        };
        let mut client = CandidateSnapshot::new("c", CandidateKind::Client);
        client.preferred_locations = ["Berlin".to_string(), "Munich".to_string()].into();
        assert_eq!(location_score(&criteria, &client, &ScoringFlags::default()), 100);

        client.preferred_locations = ["Augsburg".to_string()].into();
        client.preferred_regions = ["bavaria".to_string()].into();
        assert_eq!(location_score(&criteria, &client, &ScoringFlags::default()), 50);

        client.preferred_regions.clear();
        assert_eq!(location_score(&criteria, &client, &ScoringFlags::default()), 0);
    }

    #[test]
    fn test_size_decays_on_both_sides() {
        let criteria = SearchCriteria {
            min_area_sqm: Some(60.0),
            max_area_sqm: Some(100.0),
            ..Default::default()
        };
        let mut candidate = CandidateSnapshot::new("p", CandidateKind::Property);

        // window = 10% of 40 = 4 sqm
        candidate.living_area_sqm = Some(58.0);
        assert_eq!(scorer().score(&criteria, &candidate, &ScoringFlags::default()).area, 50);
        candidate.living_area_sqm = Some(102.0);
        assert_eq!(scorer().score(&criteria, &candidate, &ScoringFlags::default()).area, 50);
        candidate.living_area_sqm = Some(110.0);
        assert_eq!(scorer().score(&criteria, &candidate, &ScoringFlags::default()).area, 0);
    }

    #[test]
    fn test_point_target_uses_bound_for_window() {
        // 10% of 3 rooms = 0.3
        assert_eq!(size_score(Some(3.15), Some(3.0), Some(3.0), 0.10), 50);
        assert_eq!(size_score(Some(3.0), Some(3.0), Some(3.0), 0.10), 100);
        assert_eq!(size_score(Some(4.0), Some(3.0), Some(3.0), 0.10), 0);
    }

    #[test]
    fn test_size_ignores_budget_flag() {
        let flags = ScoringFlags {
            allow_budget_flexibility: false,
            ..Default::default()
        };
        let criteria = SearchCriteria {
            min_rooms: Some(2.0),
            max_rooms: Some(4.0),
            ..Default::default()
        };
        let mut candidate = CandidateSnapshot::new("p", CandidateKind::Property);
        candidate.rooms = Some(4.1);
        assert_eq!(scorer().score(&criteria, &candidate, &flags).room, 50);
    }

    #[test]
    fn test_missing_fields_score_neutral() {
        let criteria = SearchCriteria {
            min_area_sqm: Some(60.0),
            max_rooms: Some(2.0),
            max_budget: Some(100.0),
            preferred_locations: ["Hamburg".to_string()].into(),
            property_types: ["house".to_string()].into(),
            ..Default::default()
        };
        let candidate = CandidateSnapshot::new("p", CandidateKind::Property);

        let breakdown = scorer().score(&criteria, &candidate, &ScoringFlags::default());
        assert_eq!(breakdown.price, 100);
        assert_eq!(breakdown.area, 100);
        assert_eq!(breakdown.room, 100);
        assert_eq!(breakdown.location, 100);
        assert_eq!(breakdown.property_type, 100);
        assert_eq!(breakdown.aggregate, 100);
    }

    #[test]
    fn test_location_tiers() {
        let criteria = SearchCriteria {
            preferred_locations: ["Munich".to_string()].into(),
            preferred_regions: ["Bavaria".to_string()].into(),
            ..Default::default()
        };
        let mut candidate = CandidateSnapshot::new("p", CandidateKind::Property);
        candidate.city = Some(" munich ".to_string());
        candidate.state = Some("Bavaria".to_string());
        assert_eq!(location_score(&criteria, &candidate, &ScoringFlags::default()), 100);

        candidate.city = Some("Augsburg".to_string());
        assert_eq!(location_score(&criteria, &candidate, &ScoringFlags::default()), 50);

        let exact = ScoringFlags {
            exact_location_match: true,
            ..Default::default()
        };
        assert_eq!(location_score(&criteria, &candidate, &exact), 0);

        candidate.state = Some("Hesse".to_string());
        assert_eq!(location_score(&criteria, &candidate, &ScoringFlags::default()), 0);
    }

    #[test]
    fn test_location_matches_postal_code() {
        let criteria = SearchCriteria {
            preferred_locations: ["10115".to_string()].into(),
            ..Default::default()
        };
        let mut candidate = CandidateSnapshot::new("p", CandidateKind::Property);
        candidate.city = Some("Berlin".to_string());
        candidate.postal_code = Some("10115".to_string());
        assert_eq!(location_score(&criteria, &candidate, &ScoringFlags::default()), 100);
    }

    #[test]
    fn test_partial_features() {
        let criteria = SearchCriteria {
            required_features: ["balcony".to_string(), "garage".to_string()].into(),
            ..Default::default()
        };
        let mut candidate = CandidateSnapshot::new("p", CandidateKind::Property);
        candidate.features = ["Balcony".to_string()].into();

        assert_eq!(feature_score(&criteria, &candidate, &ScoringFlags::default()), 50);

        let strict = ScoringFlags {
            allow_feature_flexibility: false,
            ..Default::default()
        };
        assert_eq!(feature_score(&criteria, &candidate, &strict), 0);

        candidate.features.insert("garage".to_string());
        assert_eq!(feature_score(&criteria, &candidate, &strict), 100);
    }

    #[test]
    fn test_type_sub_checks_average() {
        let criteria = SearchCriteria {
            property_types: ["apartment".to_string()].into(),
            listing_types: ["sale".to_string()].into(),
            ..Default::default()
        };
        let mut candidate = CandidateSnapshot::new("p", CandidateKind::Property);
        candidate.property_types = ["apartment".to_string()].into();
        candidate.listing_types = ["rent".to_string()].into();
        assert_eq!(type_score(&criteria, &candidate), 50);

        candidate.property_types = ["house".to_string()].into();
        assert_eq!(type_score(&criteria, &candidate), 0);

        candidate.listing_types = ["sale".to_string()].into();
        candidate.property_types = ["apartment".to_string()].into();
        assert_eq!(type_score(&criteria, &candidate), 100);
    }

    #[test]
    fn test_aggregate_folds_type_weight() {
        // Everything perfect except type = 0: 0.9 * 100 + 0.1 * 0 = 90
        let criteria = SearchCriteria {
            property_types: ["villa".to_string()].into(),
            listing_types: ["rent".to_string()].into(),
            ..Default::default()
        };
        let mut candidate = CandidateSnapshot::new("p", CandidateKind::Property);
        candidate.property_types = ["apartment".to_string()].into();
        candidate.listing_types = ["sale".to_string()].into();

        let breakdown = scorer().score(&criteria, &candidate, &ScoringFlags::default());
        assert_eq!(breakdown.property_type, 0);
        assert_eq!(breakdown.aggregate, 90);
    }

    #[test]
    fn test_aggregate_respects_weights() {
        // price fails, rest perfect: 0.9 * (1 - 0.30) * 100 + 10 = 73
        let breakdown = score_price(&budget(0.0, 100_000.0), &priced(500_000.0));
        assert_eq!(breakdown.price, 0);
        assert_eq!(breakdown.aggregate, 73);
    }

    #[test]
    fn test_price_monotonic_above_max() {
        let criteria = budget(200_000.0, 300_000.0);
        let flags = ScoringFlags::default();
        let mut last = 100;
        for step in 0..50 {
            let candidate = priced(300_000.0 + step as f64 * 1_000.0);
            let score = scorer().score(&criteria, &candidate, &flags).price;
            assert!(score <= last);
            last = score;
        }
    }

    #[test]
    fn test_score_all_preserves_order() {
        let candidates: Vec<CandidateSnapshot> = (0..20)
            .map(|i| {
                let mut c = priced(250_000.0 + i as f64 * 5_000.0);
                c.id = format!("p{:02}", i);
                c
            })
            .collect();
        let expected: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();

        let criteria = budget(200_000.0, 300_000.0);
        let scored = scorer().score_all(&criteria, candidates, &ScoringFlags::default(), 1);
        let ids: Vec<String> = scored.iter().map(|(c, _)| c.id.clone()).collect();
        assert_eq!(ids, expected);
    }
}
