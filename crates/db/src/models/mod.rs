//! Row structs (`FromRow`) and create DTOs, one module per table.

pub mod category;
pub mod geo;
pub mod migration_run;
pub mod migration_session;
pub mod partner;
pub mod product;
pub mod source_connection;
