//! # Chartvote Common Library
//!
//! Shared code for the chartvote workspace including:
//! - Database schema, initialization and row models
//! - Error types
//! - Configuration loading and data folder resolution
//! - Timestamp utilities

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
