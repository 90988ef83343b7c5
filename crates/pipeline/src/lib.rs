//! Migration runner: phases, upsert, run bookkeeping and session
//! orchestration.
//!
//! The runner talks to the target through the traits in [`store`] and to
//! the legacy database through `cartshift_source::{RowSource, VersionSource}`.
//! [`pg::PgTargetStore`] is the production target; tests plug in memory
//! stores.

pub mod error;
pub mod pg;
pub mod phase;
pub mod run_log;
pub mod session;
pub mod store;
pub mod upsert;

pub use error::StoreError;
pub use phase::{run_phase, IdentityArena, PhaseFailure, PhaseReport, PhaseRequest};
pub use session::{run_session, SessionOutcome, SessionPlan};
pub use store::{ReferenceData, RunStore, SessionStore, TargetStore, UpsertRepository};
pub use upsert::{upsert, UpsertOutcome};
