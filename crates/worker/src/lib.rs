//! Background execution of triggered migration sessions.
//!
//! Triggering a session only moves it to `in_progress`; the
//! [`dispatcher::SessionDispatcher`] picks it up from the database and runs
//! it. Callers follow progress by polling the session row.

pub mod config;
pub mod dispatcher;

pub use config::WorkerConfig;
pub use dispatcher::SessionDispatcher;
