#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geometry store access for the civic map.
//!
//! Defines the [`GeometryStore`] trait the viewport engine queries, and the
//! `PostGIS` implementation [`queries::PostgisStore`]. Spatial queries use raw
//! SQL via `query_raw_params()`; every filter value is a bound parameter.
//! Schema creation and migrations belong to the complaint service and are
//! not run from here.

pub mod db;
pub mod queries;
pub mod store;

pub use store::GeometryStore;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
