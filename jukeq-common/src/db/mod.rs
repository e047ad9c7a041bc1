//! Database layer
//!
//! SQLite via sqlx. `init` owns pool setup and schema creation; `models`
//! holds the record types shared across components.

pub mod init;
pub mod models;

pub use init::init_database;
