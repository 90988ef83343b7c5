//! Zero-sized repository structs, one per table, taking `&PgPool`.

pub mod category_repo;
pub mod geo_repo;
pub mod migration_run_repo;
pub mod migration_session_repo;
pub mod partner_repo;
pub mod product_repo;
pub mod source_connection_repo;

pub use category_repo::CategoryRepo;
pub use geo_repo::GeoRepo;
pub use migration_run_repo::MigrationRunRepo;
pub use migration_session_repo::MigrationSessionRepo;
pub use partner_repo::PartnerRepo;
pub use product_repo::ProductRepo;
pub use source_connection_repo::SourceConnectionRepo;
