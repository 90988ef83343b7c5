//! Source connection model: a persisted legacy database descriptor.

use cartshift_core::migration::DEFAULT_LANGUAGE_CODE;
use cartshift_core::schema_version::AUTO_VERSION;
use cartshift_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// Default MySQL port.
pub const DEFAULT_SOURCE_PORT: i32 = 3306;

/// A row from the `source_connections` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SourceConnection {
    pub id: DbId,
    pub name: String,
    pub host: String,
    pub port: i32,
    pub database_name: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// `auto` or an exact schema version tag.
    pub schema_version: String,
    pub language_code: String,
    pub is_active: bool,
    pub last_sync_at: Option<Timestamp>,
    pub last_detected_version: Option<String>,
    pub last_test_at: Option<Timestamp>,
    pub last_status: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a source connection.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSourceConnection {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(custom(function = "validate_host"))]
    pub host: String,
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: Option<i32>,
    #[validate(length(min = 1, message = "Database name is required"))]
    pub database_name: String,
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub schema_version: Option<String>,
    #[validate(length(min = 1, message = "Language code cannot be empty"))]
    pub language_code: Option<String>,
}

/// Reject hosts that are empty once surrounding whitespace is removed.
pub fn validate_host(host: &str) -> Result<(), ValidationError> {
    if host.trim().is_empty() {
        return Err(ValidationError::new("required").with_message("Host is required".into()));
    }
    Ok(())
}

impl CreateSourceConnection {
    pub fn port_or_default(&self) -> i32 {
        self.port.unwrap_or(DEFAULT_SOURCE_PORT)
    }

    pub fn schema_version_or_auto(&self) -> &str {
        self.schema_version.as_deref().unwrap_or(AUTO_VERSION)
    }

    pub fn language_code_or_default(&self) -> &str {
        self.language_code.as_deref().unwrap_or(DEFAULT_LANGUAGE_CODE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(host: &str) -> CreateSourceConnection {
        CreateSourceConnection {
            name: "Shop".into(),
            host: host.into(),
            port: None,
            database_name: "cscart".into(),
            username: "reader".into(),
            password: String::new(),
            schema_version: None,
            language_code: None,
        }
    }

    #[test]
    fn blank_host_is_rejected() {
        let errors = input("   ").validate().unwrap_err();
        let host_errors = errors.field_errors();
        let host = &host_errors["host"];
        assert_eq!(host[0].message.as_deref(), Some("Host is required"));
        assert!(input("").validate().is_err());
    }

    #[test]
    fn host_with_padding_is_accepted() {
        assert!(input(" db.local ").validate().is_ok());
    }

    #[test]
    fn defaults_apply_when_omitted() {
        let i = input("db.local");
        assert_eq!(i.port_or_default(), DEFAULT_SOURCE_PORT);
        assert_eq!(i.schema_version_or_auto(), AUTO_VERSION);
        assert_eq!(i.language_code_or_default(), DEFAULT_LANGUAGE_CODE);
    }
}
