//! The read contract every complaint geometry store provides.

use async_trait::async_trait;
use civic_map_complaint_models::ComplaintGeoRecord;
use civic_map_database_models::{ComplaintFilter, PointQuery, RegionCountRow};

use crate::DbError;

/// A record store holding complaints with a WGS84 point geometry.
///
/// Implementations must apply [`ComplaintFilter`] exactly as
/// [`ComplaintFilter::matches`] does, including the visibility predicate.
#[async_trait]
pub trait GeometryStore: Send + Sync {
    /// Fetches matching records ordered by creation time descending, with
    /// the complaint id descending as tie-break.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the underlying query fails.
    async fn fetch_points(&self, query: &PointQuery) -> Result<Vec<ComplaintGeoRecord>, DbError>;

    /// Counts all records matching the filter.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the underlying query fails.
    async fn count(&self, filter: &ComplaintFilter) -> Result<u64, DbError>;

    /// Counts matching records per administrative region. Records without a
    /// region code are left out.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the underlying query fails.
    async fn count_by_region(&self, filter: &ComplaintFilter)
    -> Result<Vec<RegionCountRow>, DbError>;
}
