//! Repository for the `countries` and `country_states` reference tables.

use sqlx::PgPool;

use crate::models::geo::{Country, CountryState};

/// Read access to geographic reference data.
pub struct GeoRepo;

impl GeoRepo {
    pub async fn list_countries(pool: &PgPool) -> Result<Vec<Country>, sqlx::Error> {
        sqlx::query_as::<_, Country>(
            "SELECT id, code, name, created_at, updated_at FROM countries ORDER BY code",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn list_states(pool: &PgPool) -> Result<Vec<CountryState>, sqlx::Error> {
        sqlx::query_as::<_, CountryState>(
            "SELECT id, country_id, code, name, created_at, updated_at
             FROM country_states
             ORDER BY country_id, name",
        )
        .fetch_all(pool)
        .await
    }
}
