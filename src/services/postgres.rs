use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use crate::models::{
    CandidateKind, CandidateSnapshot, Client, MatchingMode, Property, SearchCriteria,
};
use crate::services::ports::{
    CandidateRepository, ClientCriteriaProvider, ContactHistoryProvider, RepositoryError,
};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

impl From<PostgresError> for RepositoryError {
    fn from(err: PostgresError) -> Self {
        RepositoryError::unavailable("postgres", err)
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        PostgresError::from(err).into()
    }
}

const PROPERTY_COLUMNS: &str = r#"
    id, agent_id, title, price, living_area_sqm, rooms, city, postal_code, state,
    features, property_type, listing_type, status, created_at
"#;

/// PostgreSQL adapter for the CRM tables the match engine reads.
///
/// Implements every collaborator port. All candidate queries are scoped to
/// the requesting agent.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    async fn properties_for_agent(&self, agent_id: &str) -> Result<Vec<Property>, PostgresError> {
        let query = format!(
            "SELECT {} FROM properties WHERE agent_id = $1 ORDER BY id",
            PROPERTY_COLUMNS
        );

        let rows = sqlx::query(&query).bind(agent_id).fetch_all(&self.pool).await?;

        rows.iter().map(property_from_row).collect()
    }

    async fn clients_for_agent(&self, agent_id: &str) -> Result<Vec<Client>, PostgresError> {
        let query = r#"
            SELECT c.id, c.agent_id, c.first_name, c.last_name, c.is_active, c.created_at,
                   s.client_id AS criteria_client_id,
                   s.min_area_sqm, s.max_area_sqm, s.min_rooms, s.max_rooms,
                   s.min_budget, s.max_budget, s.preferred_locations, s.preferred_regions,
                   s.property_types, s.listing_types, s.required_features
            FROM clients c
            LEFT JOIN client_search_criteria s ON s.client_id = c.id
            WHERE c.agent_id = $1
            ORDER BY c.id
        "#;

        let rows = sqlx::query(query).bind(agent_id).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                let has_criteria: Option<String> = row.try_get("criteria_client_id")?;
                let search_criteria = match has_criteria {
                    Some(_) => Some(criteria_from_row(row)?),
                    None => None,
                };

                Ok(Client {
                    id: row.try_get("id")?,
                    agent_id: row.try_get("agent_id")?,
                    first_name: row.try_get("first_name")?,
                    last_name: row.try_get("last_name")?,
                    is_active: row.try_get("is_active")?,
                    search_criteria,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn property_from_row(row: &PgRow) -> Result<Property, PostgresError> {
    let features: Option<Vec<String>> = row.try_get("features")?;

    Ok(Property {
        id: row.try_get("id")?,
        agent_id: row.try_get("agent_id")?,
        title: row.try_get("title")?,
        price: row.try_get("price")?,
        living_area_sqm: row.try_get("living_area_sqm")?,
        rooms: row.try_get("rooms")?,
        city: row.try_get("city")?,
        postal_code: row.try_get("postal_code")?,
        state: row.try_get("state")?,
        features: features.unwrap_or_default(),
        property_type: row.try_get("property_type")?,
        listing_type: row.try_get("listing_type")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
    })
}

fn criteria_from_row(row: &PgRow) -> Result<SearchCriteria, PostgresError> {
    let set = |column: &str| -> Result<_, PostgresError> {
        let values: Option<Vec<String>> = row.try_get(column)?;
        Ok(values.unwrap_or_default().into_iter().collect())
    };

    Ok(SearchCriteria {
        min_area_sqm: row.try_get("min_area_sqm")?,
        max_area_sqm: row.try_get("max_area_sqm")?,
        min_rooms: row.try_get("min_rooms")?,
        max_rooms: row.try_get("max_rooms")?,
        min_budget: row.try_get("min_budget")?,
        max_budget: row.try_get("max_budget")?,
        preferred_locations: set("preferred_locations")?,
        preferred_regions: set("preferred_regions")?,
        property_types: set("property_types")?,
        listing_types: set("listing_types")?,
        required_features: set("required_features")?,
    })
}

#[async_trait]
impl CandidateRepository for PostgresClient {
    async fn fetch_candidates(
        &self,
        agent_id: &str,
        mode: &MatchingMode,
        _criteria: &SearchCriteria,
    ) -> Result<Vec<CandidateSnapshot>, RepositoryError> {
        let snapshots: Vec<CandidateSnapshot> = match mode.candidate_kind() {
            CandidateKind::Property => self
                .properties_for_agent(agent_id)
                .await?
                .iter()
                .map(CandidateSnapshot::from)
                .collect(),
            CandidateKind::Client => self
                .clients_for_agent(agent_id)
                .await?
                .iter()
                .map(CandidateSnapshot::from)
                .collect(),
        };

        tracing::debug!(
            "Loaded {} {:?} candidates for agent {}",
            snapshots.len(),
            mode.candidate_kind(),
            agent_id
        );

        Ok(snapshots)
    }

    async fn find_property(
        &self,
        agent_id: &str,
        property_id: &str,
    ) -> Result<Option<CandidateSnapshot>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM properties WHERE agent_id = $1 AND id = $2",
            PROPERTY_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(agent_id)
            .bind(property_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(CandidateSnapshot::from(&property_from_row(&row)?))),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ClientCriteriaProvider for PostgresClient {
    async fn get_search_criteria(
        &self,
        client_id: &str,
    ) -> Result<Option<SearchCriteria>, RepositoryError> {
        let query = r#"
            SELECT s.client_id AS criteria_client_id,
                   s.min_area_sqm, s.max_area_sqm, s.min_rooms, s.max_rooms,
                   s.min_budget, s.max_budget, s.preferred_locations, s.preferred_regions,
                   s.property_types, s.listing_types, s.required_features
            FROM clients c
            LEFT JOIN client_search_criteria s ON s.client_id = c.id
            WHERE c.id = $1
        "#;

        let Some(row) = sqlx::query(query)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let has_criteria: Option<String> = row.try_get("criteria_client_id")?;
        // A client without stored preferences matches on nothing in particular
        let criteria = match has_criteria {
            Some(_) => criteria_from_row(&row)?,
            None => SearchCriteria::default(),
        };

        Ok(Some(criteria))
    }
}

#[async_trait]
impl ContactHistoryProvider for PostgresClient {
    async fn was_contacted(
        &self,
        agent_id: &str,
        kind: CandidateKind,
        candidate_id: &str,
    ) -> Result<bool, RepositoryError> {
        let query = match kind {
            CandidateKind::Property => r#"
                SELECT EXISTS (
                    SELECT 1 FROM call_notes WHERE agent_id = $1 AND property_id = $2
                ) AS contacted
            "#,
            CandidateKind::Client => r#"
                SELECT EXISTS (
                    SELECT 1 FROM call_notes WHERE agent_id = $1 AND client_id = $2
                ) AS contacted
            "#,
        };

        let row = sqlx::query(query)
            .bind(agent_id)
            .bind(candidate_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("contacted")?)
    }

    async fn view_count(
        &self,
        agent_id: &str,
        kind: CandidateKind,
        candidate_id: &str,
    ) -> Result<u32, RepositoryError> {
        let query = r#"
            SELECT view_count FROM candidate_views
            WHERE agent_id = $1 AND candidate_kind = $2 AND candidate_id = $3
        "#;

        let count: Option<i32> = sqlx::query(query)
            .bind(agent_id)
            .bind(kind.as_str())
            .bind(candidate_id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| row.try_get("view_count"))
            .transpose()?;

        Ok(count.unwrap_or(0).max(0) as u32)
    }
}
