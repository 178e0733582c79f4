use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use std::collections::BTreeSet;

/// A client's search preferences, or an ad-hoc criteria set supplied per request.
///
/// Every bound is optional; a missing bound leaves that side of the range
/// unconstrained. Empty sets mean "no constraint" for that dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    #[serde(rename = "minLivingAreaSqm", default)]
    pub min_area_sqm: Option<f64>,
    #[serde(rename = "maxLivingAreaSqm", default)]
    pub max_area_sqm: Option<f64>,
    #[serde(rename = "minRooms", default)]
    pub min_rooms: Option<f64>,
    #[serde(rename = "maxRooms", default)]
    pub max_rooms: Option<f64>,
    #[serde(rename = "minBudget", default)]
    pub min_budget: Option<f64>,
    #[serde(rename = "maxBudget", default)]
    pub max_budget: Option<f64>,
    /// City names or postal codes
    #[serde(rename = "preferredLocations", default)]
    pub preferred_locations: BTreeSet<String>,
    /// States/regions that earn partial location credit
    #[serde(rename = "preferredRegions", default)]
    pub preferred_regions: BTreeSet<String>,
    #[serde(rename = "propertyTypes", default)]
    pub property_types: BTreeSet<String>,
    #[serde(rename = "listingTypes", default)]
    pub listing_types: BTreeSet<String>,
    #[serde(rename = "requiredFeatures", default)]
    pub required_features: BTreeSet<String>,
}

/// Which side of the market a candidate comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    Property,
    Client,
}

impl CandidateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateKind::Property => "property",
            CandidateKind::Client => "client",
        }
    }
}

/// Read-only view of a property or a client, carrying only what the scorer needs.
///
/// Built once per match run from repository rows and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSnapshot {
    pub id: String,
    pub kind: CandidateKind,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(rename = "livingAreaSqm", default)]
    pub living_area_sqm: Option<f64>,
    #[serde(default)]
    pub rooms: Option<f64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(rename = "postalCode", default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Every place a client would accept; empty for properties
    #[serde(rename = "preferredLocations", default, skip_serializing_if = "BTreeSet::is_empty")]
    pub preferred_locations: BTreeSet<String>,
    #[serde(rename = "preferredRegions", default, skip_serializing_if = "BTreeSet::is_empty")]
    pub preferred_regions: BTreeSet<String>,
    #[serde(default)]
    pub features: BTreeSet<String>,
    #[serde(rename = "propertyTypes", default)]
    pub property_types: BTreeSet<String>,
    #[serde(rename = "listingTypes", default)]
    pub listing_types: BTreeSet<String>,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool { true }

impl CandidateSnapshot {
    /// Empty snapshot with only the identity set; every scored field is missing.
    pub fn new(id: impl Into<String>, kind: CandidateKind) -> Self {
        Self {
            id: id.into(),
            kind,
            price: None,
            living_area_sqm: None,
            rooms: None,
            city: None,
            postal_code: None,
            state: None,
            preferred_locations: BTreeSet::new(),
            preferred_regions: BTreeSet::new(),
            features: BTreeSet::new(),
            property_types: BTreeSet::new(),
            listing_types: BTreeSet::new(),
            available: true,
            created_at: None,
        }
    }
}

/// Property types offered by the CRM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "property_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Apartment,
    House,
    Villa,
    Townhouse,
    Land,
    Commercial,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::House => "house",
            PropertyType::Villa => "villa",
            PropertyType::Townhouse => "townhouse",
            PropertyType::Land => "land",
            PropertyType::Commercial => "commercial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "listing_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Sale,
    Rent,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Sale => "sale",
            ListingType::Rent => "rent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "property_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Available,
    Reserved,
    Sold,
    Rented,
    Withdrawn,
}

/// A property listing as stored by the CRM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    #[serde(rename = "agentId")]
    pub agent_id: String,
    pub title: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(rename = "livingAreaSqm", default)]
    pub living_area_sqm: Option<f64>,
    #[serde(default)]
    pub rooms: Option<f64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(rename = "postalCode", default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(rename = "propertyType", default)]
    pub property_type: Option<PropertyType>,
    #[serde(rename = "listingType", default)]
    pub listing_type: Option<ListingType>,
    pub status: PropertyStatus,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Property> for CandidateSnapshot {
    fn from(property: &Property) -> Self {
        Self {
            id: property.id.clone(),
            kind: CandidateKind::Property,
            price: property.price,
            living_area_sqm: property.living_area_sqm,
            rooms: property.rooms,
            city: property.city.clone(),
            postal_code: property.postal_code.clone(),
            state: property.state.clone(),
            preferred_locations: BTreeSet::new(),
            preferred_regions: BTreeSet::new(),
            features: property.features.iter().cloned().collect(),
            property_types: property
                .property_type
                .iter()
                .map(|t| t.as_str().to_string())
                .collect(),
            listing_types: property
                .listing_type
                .iter()
                .map(|t| t.as_str().to_string())
                .collect(),
            available: property.status == PropertyStatus::Available,
            created_at: property.created_at,
        }
    }
}

/// A client record as stored by the CRM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    #[serde(rename = "agentId")]
    pub agent_id: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
    #[serde(rename = "searchCriteria", default)]
    pub search_criteria: Option<SearchCriteria>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Client> for CandidateSnapshot {
    /// Projects a client's wishes onto the property-shaped snapshot so the
    /// same scorer can rank clients against a property.
    fn from(client: &Client) -> Self {
        let mut snapshot = CandidateSnapshot::new(client.id.clone(), CandidateKind::Client);
        snapshot.available = client.is_active;
        snapshot.created_at = client.created_at;

        if let Some(criteria) = &client.search_criteria {
            snapshot.price = criteria.max_budget.or(criteria.min_budget);
            snapshot.living_area_sqm = midpoint(criteria.min_area_sqm, criteria.max_area_sqm);
            snapshot.rooms = midpoint(criteria.min_rooms, criteria.max_rooms);
            snapshot.preferred_locations = criteria.preferred_locations.clone();
            snapshot.preferred_regions = criteria.preferred_regions.clone();
            snapshot.features = criteria.required_features.clone();
            snapshot.property_types = criteria.property_types.clone();
            snapshot.listing_types = criteria.listing_types.clone();
        }

        snapshot
    }
}

fn midpoint(min: Option<f64>, max: Option<f64>) -> Option<f64> {
    match (min, max) {
        (Some(lo), Some(hi)) => Some((lo + hi) / 2.0),
        (lo, hi) => lo.or(hi),
    }
}

/// What a request matches against; exactly one per request
#[derive(Debug, Clone, PartialEq)]
pub enum MatchingMode {
    /// Rank properties for a stored client profile
    Client { client_id: String },
    /// Rank clients interested in a property
    Property { property_id: String },
    /// Rank properties against criteria supplied in the request
    Custom(SearchCriteria),
}

impl MatchingMode {
    /// The kind of candidate this mode ranks
    pub fn candidate_kind(&self) -> CandidateKind {
        match self {
            MatchingMode::Property { .. } => CandidateKind::Client,
            MatchingMode::Client { .. } | MatchingMode::Custom(_) => CandidateKind::Property,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchingMode::Client { .. } => "client",
            MatchingMode::Property { .. } => "property",
            MatchingMode::Custom(_) => "custom",
        }
    }
}

/// User-facing category weights.
///
/// Built through [`ScoringWeights::normalized`], which guarantees the five
/// weights sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub price: f64,
    pub location: f64,
    pub area: f64,
    pub room: f64,
    pub feature: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            price: 0.30,
            location: 0.25,
            area: 0.20,
            room: 0.15,
            feature: 0.10,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.price + self.location + self.area + self.room + self.feature
    }

    fn peak(&self) -> f64 {
        [self.price, self.location, self.area, self.room, self.feature]
            .into_iter()
            .fold(0.0, f64::max)
    }

    /// Scale to a unit sum, substituting `fallback` for an all-zero vector.
    ///
    /// Callers must reject negative and non-finite components beforehand.
    pub fn normalized(self, fallback: ScoringWeights) -> Self {
        self.to_unit()
            .or_else(|| fallback.to_unit())
            .unwrap_or_default()
    }

    /// Dividing by the largest component first keeps the sum in 1..=5, so
    /// neither huge nor subnormal inputs overflow.
    fn to_unit(self) -> Option<Self> {
        let peak = self.peak();
        if !(peak > 0.0 && peak.is_finite()) {
            return None;
        }
        let relative = self.divided(peak);
        Some(relative.divided(relative.sum()))
    }

    fn divided(self, divisor: f64) -> Self {
        Self {
            price: self.price / divisor,
            location: self.location / divisor,
            area: self.area / divisor,
            room: self.room / divisor,
            feature: self.feature / divisor,
        }
    }
}

/// Per-category scores for one candidate, each in 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub price: u8,
    pub location: u8,
    pub area: u8,
    pub room: u8,
    pub feature: u8,
    #[serde(rename = "type")]
    pub property_type: u8,
    pub aggregate: u8,
}

impl ScoreBreakdown {
    pub fn categories(&self) -> [u8; 6] {
        [
            self.price,
            self.location,
            self.area,
            self.room,
            self.feature,
            self.property_type,
        ]
    }

    pub fn min(&self) -> u8 {
        self.categories().into_iter().min().unwrap_or(0)
    }

    pub fn max(&self) -> u8 {
        self.categories().into_iter().max().unwrap_or(0)
    }

    pub fn average(&self) -> f64 {
        let scores = self.categories();
        scores.iter().map(|&s| s as f64).sum::<f64>() / scores.len() as f64
    }
}

/// One ranked candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub candidate: CandidateSnapshot,
    #[serde(rename = "matchScore")]
    pub match_score: u8,
    pub breakdown: ScoreBreakdown,
    #[serde(rename = "matchReasons")]
    pub match_reasons: Vec<String>,
    #[serde(rename = "mismatchReasons")]
    pub mismatch_reasons: Vec<String>,
    #[serde(rename = "previouslyContacted")]
    pub previously_contacted: bool,
    #[serde(rename = "viewCount")]
    pub view_count: u32,
}
