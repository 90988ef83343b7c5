//! Client for the legacy storefront database (MySQL protocol).
//!
//! Every operation opens its own connection with a bounded connect timeout
//! and closes it before returning. Connections are never pooled or shared
//! between phases.

pub mod connection;
pub mod connection_test;
pub mod descriptor;
pub mod error;
pub mod extract;
pub mod probe;
pub mod resolver;

pub use connection_test::{test_connection, ConnectionTestReport};
pub use descriptor::SourceDescriptor;
pub use error::SourceError;
pub use extract::{extract, MySqlSource, RowSource};
pub use probe::{MySqlProbe, SchemaProbe};
pub use resolver::{detect_version, probe_version, resolve_declared, ResolvedVersion, VersionSource};
