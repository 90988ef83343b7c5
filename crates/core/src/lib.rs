//! Pure domain logic for the legacy storefront migration engine.
//!
//! Nothing in this crate touches a database, the network, or the
//! filesystem. Source extraction lives in `cartshift-source`, target
//! persistence in `cartshift-db`, and orchestration in `cartshift-pipeline`.

pub mod error;
pub mod export;
pub mod mapping;
pub mod migration;
pub mod pagination;
pub mod query_registry;
pub mod row;
pub mod schema_version;
pub mod types;
