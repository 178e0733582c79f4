use crate::core::scoring::{fold, folded};
use crate::models::{CandidateKind, CandidateSnapshot, ScoreBreakdown, SearchCriteria};

/// Category scores at or above this produce a match reason
pub const MATCH_REASON_MIN: u8 = 80;
/// Category scores below this produce a mismatch reason
pub const MISMATCH_REASON_MAX: u8 = 50;

/// Short explanations for a score breakdown.
///
/// Returns `(match_reasons, mismatch_reasons)` in fixed category order:
/// price, location, area, rooms, features, type. Scores in the neutral
/// band produce nothing.
pub fn explain(
    breakdown: &ScoreBreakdown,
    criteria: &SearchCriteria,
    candidate: &CandidateSnapshot,
) -> (Vec<String>, Vec<String>) {
    let mut matches = Vec::new();
    let mut mismatches = Vec::new();

    let mut push = |score: u8, good: String, bad: String| {
        if score >= MATCH_REASON_MIN {
            matches.push(good);
        } else if score < MISMATCH_REASON_MAX {
            mismatches.push(bad);
        }
    };

    push(
        breakdown.price,
        "Price within budget".to_string(),
        price_mismatch(criteria, candidate),
    );
    push(
        breakdown.location,
        "Location matches preferences".to_string(),
        "Location outside preferred areas".to_string(),
    );
    push(
        breakdown.area,
        "Living area fits requirements".to_string(),
        range_mismatch(
            "Living area",
            candidate.living_area_sqm,
            criteria.min_area_sqm,
            criteria.max_area_sqm,
        ),
    );
    push(
        breakdown.room,
        "Room count fits requirements".to_string(),
        range_mismatch("Room count", candidate.rooms, criteria.min_rooms, criteria.max_rooms),
    );
    push(
        breakdown.feature,
        if breakdown.feature == 100 {
            "All required features present".to_string()
        } else {
            "Most required features present".to_string()
        },
        feature_mismatch(criteria, candidate),
    );
    push(
        breakdown.property_type,
        "Property type matches".to_string(),
        "Property and listing type do not match".to_string(),
    );

    (matches, mismatches)
}

fn price_mismatch(criteria: &SearchCriteria, candidate: &CandidateSnapshot) -> String {
    match candidate.kind {
        CandidateKind::Property => match (candidate.price, criteria.max_budget) {
            (Some(price), Some(max)) if max > 0.0 && price > max => {
                format!("Price exceeds budget by {}%", percent(price - max, max))
            }
            _ => "Price outside budget".to_string(),
        },
        CandidateKind::Client => match (candidate.price, criteria.min_budget) {
            (Some(budget), Some(min)) if min > 0.0 && budget < min => {
                format!("Budget {}% below price range", percent(min - budget, min))
            }
            _ => "Budget outside price range".to_string(),
        },
    }
}

fn range_mismatch(label: &str, value: Option<f64>, min: Option<f64>, max: Option<f64>) -> String {
    match (value, min, max) {
        (Some(v), Some(lo), _) if v < lo && lo > 0.0 => {
            format!("{} {}% below minimum", label, percent(lo - v, lo))
        }
        (Some(v), _, Some(hi)) if v > hi && hi > 0.0 => {
            format!("{} {}% above maximum", label, percent(v - hi, hi))
        }
        _ => format!("{} outside requested range", label),
    }
}

fn feature_mismatch(criteria: &SearchCriteria, candidate: &CandidateSnapshot) -> String {
    let present = folded(&candidate.features);
    let missing: Vec<&str> = criteria
        .required_features
        .iter()
        .filter(|feature| !present.contains(&fold(feature)))
        .map(|feature| feature.trim())
        .collect();

    if missing.is_empty() {
        "Required features missing".to_string()
    } else {
        format!("Missing features: {}", missing.join(", "))
    }
}

#[inline]
fn percent(delta: f64, base: f64) -> i64 {
    (delta / base * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(
        price: u8,
        location: u8,
        area: u8,
        room: u8,
        feature: u8,
        property_type: u8,
    ) -> ScoreBreakdown {
        ScoreBreakdown {
            price,
            location,
            area,
            room,
            feature,
            property_type,
            aggregate: 0,
        }
    }

    #[test]
    fn test_all_good_all_matches() {
        let candidate = CandidateSnapshot::new("p", CandidateKind::Property);
        let criteria = SearchCriteria::default();
        let (good, bad) = explain(&breakdown(100, 100, 100, 100, 100, 100), &criteria, &candidate);
        assert_eq!(good.len(), 6);
        assert!(bad.is_empty());
        assert_eq!(good[0], "Price within budget");
        assert_eq!(good[4], "All required features present");
    }

    #[test]
    fn test_neutral_band_is_silent() {
        let candidate = CandidateSnapshot::new("p", CandidateKind::Property);
        let criteria = SearchCriteria::default();
        let (good, bad) = explain(&breakdown(50, 79, 60, 70, 50, 50), &criteria, &candidate);
        assert!(good.is_empty());
        assert!(bad.is_empty());
    }

    #[test]
    fn test_price_overshoot_magnitude() {
        let criteria = SearchCriteria {
            max_budget: Some(300_000.0),
            ..Default::default()
        };
        let mut candidate = CandidateSnapshot::new("p", CandidateKind::Property);
        candidate.price = Some(321_000.0);

        let (_, bad) = explain(&breakdown(30, 100, 100, 100, 100, 100), &criteria, &candidate);
        assert_eq!(bad, vec!["Price exceeds budget by 7%".to_string()]);
    }

    #[test]
    fn test_client_budget_shortfall_magnitude() {
        let criteria = SearchCriteria {
            min_budget: Some(270_000.0),
            max_budget: Some(330_000.0),
            ..Default::default()
        };
        let mut candidate = CandidateSnapshot::new("c", CandidateKind::Client);
        candidate.price = Some(100_000.0);

        let (good, bad) = explain(&breakdown(0, 100, 100, 100, 100, 100), &criteria, &candidate);
        assert!(!good.contains(&"Price within budget".to_string()));
        assert_eq!(bad, vec!["Budget 63% below price range".to_string()]);
    }

    #[test]
    fn test_area_and_room_magnitudes() {
        let criteria = SearchCriteria {
            min_area_sqm: Some(100.0),
            max_rooms: Some(4.0),
            ..Default::default()
        };
        let mut candidate = CandidateSnapshot::new("p", CandidateKind::Property);
        candidate.living_area_sqm = Some(80.0);
        candidate.rooms = Some(5.0);

        let (_, bad) = explain(&breakdown(100, 100, 0, 0, 100, 100), &criteria, &candidate);
        assert_eq!(bad[0], "Living area 20% below minimum");
        assert_eq!(bad[1], "Room count 25% above maximum");
    }

    #[test]
    fn test_missing_features_named() {
        let criteria = SearchCriteria {
            required_features: ["balcony", "garage", "garden"]
                .iter()
                .map(|f| f.to_string())
                .collect(),
            ..Default::default()
        };
        let mut candidate = CandidateSnapshot::new("p", CandidateKind::Property);
        candidate.features = ["Garage".to_string()].into();

        let (_, bad) = explain(&breakdown(100, 100, 100, 100, 33, 100), &criteria, &candidate);
        assert_eq!(bad, vec!["Missing features: balcony, garden".to_string()]);
    }
}
