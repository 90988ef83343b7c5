//! Connection parameters of a legacy database.

use cartshift_core::schema_version::DeclaredVersion;
use sqlx::mysql::MySqlConnectOptions;

/// Everything needed to reach a legacy database and read it.
#[derive(Clone)]
pub struct SourceDescriptor {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub declared_version: DeclaredVersion,
}

impl SourceDescriptor {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            username: username.into(),
            password: password.into(),
            declared_version: DeclaredVersion::Auto,
        }
    }

    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .password(&self.password)
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for SourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("declared_version", &self.declared_version)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_password() {
        let d = SourceDescriptor::new("db", 3306, "shop", "reader", "hunter2");
        let rendered = format!("{d:?}");
        assert!(rendered.contains("shop"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn defaults_to_auto_detection() {
        let d = SourceDescriptor::new("db", 3306, "shop", "reader", "");
        assert_eq!(d.declared_version, DeclaredVersion::Auto);
    }
}
