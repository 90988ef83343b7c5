//! Migration session model: one orchestration pass and its status snapshot.

use cartshift_core::migration::{format_duration, EntityType, SessionState, DEFAULT_BATCH_SIZE};
use cartshift_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `migration_sessions` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MigrationSession {
    pub id: DbId,
    pub connection_id: DbId,
    pub name: String,
    pub state: String,
    pub import_categories: bool,
    pub import_products: bool,
    pub import_customers: bool,
    pub import_suppliers: bool,
    pub update_existing: bool,
    pub batch_size: i32,
    pub language_code: String,
    pub progress: f64,
    pub current_operation: String,
    pub log_message: String,
    pub categories_imported: i32,
    pub products_imported: i32,
    pub customers_imported: i32,
    pub suppliers_imported: i32,
    pub resolved_version: Option<String>,
    pub retry_of: Option<DbId>,
    pub claimed_at: Option<Timestamp>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MigrationSession {
    /// Parsed state; unknown values read as draft.
    pub fn state(&self) -> SessionState {
        SessionState::from_str(&self.state).unwrap_or(SessionState::Draft)
    }

    /// Entity types the trigger selected, in dependency order.
    pub fn enabled_entity_types(&self) -> Vec<EntityType> {
        EntityType::ORDERED
            .into_iter()
            .filter(|t| self.is_enabled(*t))
            .collect()
    }

    pub fn is_enabled(&self, entity_type: EntityType) -> bool {
        match entity_type {
            EntityType::Category => self.import_categories,
            EntityType::Product => self.import_products,
            EntityType::Customer => self.import_customers,
            EntityType::Supplier => self.import_suppliers,
        }
    }

    /// Options of this session as a fresh trigger, used by retry.
    pub fn to_retry(&self) -> CreateMigrationSession {
        CreateMigrationSession {
            connection_id: self.connection_id,
            name: Some(self.name.clone()),
            import_categories: Some(self.import_categories),
            import_products: Some(self.import_products),
            import_customers: Some(self.import_customers),
            import_suppliers: Some(self.import_suppliers),
            update_existing: Some(self.update_existing),
            batch_size: Some(self.batch_size),
            language_code: Some(self.language_code.clone()),
        }
    }
}

/// DTO for triggering a migration session.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMigrationSession {
    pub connection_id: DbId,
    pub name: Option<String>,
    pub import_categories: Option<bool>,
    pub import_products: Option<bool>,
    pub import_customers: Option<bool>,
    pub import_suppliers: Option<bool>,
    pub update_existing: Option<bool>,
    #[validate(range(min = 1, max = 1000, message = "Batch size must be between 1 and 1000"))]
    pub batch_size: Option<i32>,
    #[validate(length(min = 1, message = "Language code cannot be empty"))]
    pub language_code: Option<String>,
}

impl CreateMigrationSession {
    pub fn import_categories(&self) -> bool {
        self.import_categories.unwrap_or(true)
    }

    pub fn import_products(&self) -> bool {
        self.import_products.unwrap_or(true)
    }

    pub fn import_customers(&self) -> bool {
        self.import_customers.unwrap_or(true)
    }

    pub fn import_suppliers(&self) -> bool {
        self.import_suppliers.unwrap_or(false)
    }

    pub fn update_existing(&self) -> bool {
        self.update_existing.unwrap_or(true)
    }

    pub fn batch_size(&self) -> i32 {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    /// Fill in the connection's language when the trigger names none.
    pub fn with_default_language(mut self, connection_language: &str) -> Self {
        if self.language_code.is_none() {
            self.language_code = Some(connection_language.to_string());
        }
        self
    }

    /// At least one entity type must be selected.
    pub fn has_any_entity(&self) -> bool {
        self.import_categories()
            || self.import_products()
            || self.import_customers()
            || self.import_suppliers()
    }
}

/// Read-only status snapshot polled by callers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub id: DbId,
    pub progress: f64,
    pub state: String,
    pub current_operation: String,
    pub log_message: String,
    pub categories_imported: i32,
    pub products_imported: i32,
    pub customers_imported: i32,
    pub suppliers_imported: i32,
    pub resolved_version: Option<String>,
    pub duration: Option<String>,
}

impl From<&MigrationSession> for SessionStatus {
    fn from(s: &MigrationSession) -> Self {
        let duration = match (s.start_time, s.end_time) {
            (Some(start), Some(end)) => {
                Some(format_duration((end - start).num_milliseconds() as f64 / 1000.0))
            }
            _ => None,
        };
        Self {
            id: s.id,
            progress: s.progress,
            state: s.state.clone(),
            current_operation: s.current_operation.clone(),
            log_message: s.log_message.clone(),
            categories_imported: s.categories_imported,
            products_imported: s.products_imported,
            customers_imported: s.customers_imported,
            suppliers_imported: s.suppliers_imported,
            resolved_version: s.resolved_version.clone(),
            duration,
        }
    }
}
