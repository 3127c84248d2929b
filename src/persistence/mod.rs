//! Persistence layer: PostgreSQL event log and pool snapshots.
//!
//! [`postgres::PostgresPersistence`] wraps a `sqlx::PgPool`; the tasks in
//! [`recorder`] feed it from the running service. Persistence is optional
//! and never on the trading path: operations commit in memory first.

pub mod models;
pub mod postgres;
pub mod recorder;

pub use postgres::PostgresPersistence;
