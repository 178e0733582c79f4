use std::cmp::Ordering;
use crate::core::validation::NormalizedRequest;
use crate::models::{MatchResult, SortBy, SortDirection};

/// Filter, sort and truncate scored results.
///
/// Returns the surviving results and the number that passed the filters
/// before truncation to `max_results`.
pub fn rank(results: Vec<MatchResult>, request: &NormalizedRequest) -> (Vec<MatchResult>, usize) {
    let mut ranked: Vec<MatchResult> = results
        .into_iter()
        .filter(|r| passes_filters(r, request))
        .collect();

    let total_matches = ranked.len();

    ranked.sort_by(|a, b| compare(a, b, request.sort_by, request.sort_direction));
    ranked.truncate(request.max_results);

    (ranked, total_matches)
}

/// Threshold is inclusive
#[inline]
pub fn passes_filters(result: &MatchResult, request: &NormalizedRequest) -> bool {
    result.match_score >= request.match_threshold
        && (request.include_unavailable || result.candidate.available)
        && (request.include_contacted || !result.previously_contacted)
}

/// Total order: requested key first, candidate id ascending last.
///
/// Candidates missing the requested key sort after those that have it,
/// whatever the direction.
pub fn compare(
    a: &MatchResult,
    b: &MatchResult,
    sort_by: SortBy,
    direction: SortDirection,
) -> Ordering {
    let primary = match sort_by {
        SortBy::MatchScore => directed(a.match_score.cmp(&b.match_score), direction),
        SortBy::Price => compare_optional(a.candidate.price, b.candidate.price, direction),
        SortBy::LivingAreaSqm => compare_optional(
            a.candidate.living_area_sqm,
            b.candidate.living_area_sqm,
            direction,
        ),
        SortBy::Rooms => compare_optional(a.candidate.rooms, b.candidate.rooms, direction),
        SortBy::CreatedAt => match (a.candidate.created_at, b.candidate.created_at) {
            (Some(x), Some(y)) => directed(x.cmp(&y), direction),
            (x, y) => missing_last(x.is_some(), y.is_some()),
        },
    };

    primary.then_with(|| a.candidate.id.cmp(&b.candidate.id))
}

#[inline]
fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn compare_optional(a: Option<f64>, b: Option<f64>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => directed(x.total_cmp(&y), direction),
        (x, y) => missing_last(x.is_some(), y.is_some()),
    }
}

#[inline]
fn missing_last(a_present: bool, b_present: bool) -> Ordering {
    b_present.cmp(&a_present)
}
