//! # Jukeq Common Library
//!
//! Shared code for the jukeq music-queue service:
//! - Error taxonomy (Error/Result)
//! - Event types (QueueEvent enum)
//! - Configuration loading
//! - Database models and initialization

pub mod config;
pub mod db;
pub mod error;
pub mod events;

pub use error::{Error, Result};
