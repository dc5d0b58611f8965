//! Individual complaint markers for zoomed-in views.

use civic_map_database::{DbError, GeometryStore};
use civic_map_database_models::{ComplaintFilter, PointQuery};
use civic_map_viewport_models::MarkerItem;

use crate::request::CapPolicy;

/// Marker cap: 2,000 by default, at most 10,000.
pub const MARKER_CAP: CapPolicy = CapPolicy {
    default: 2_000,
    max: 10_000,
};

/// Fetches up to `cap` markers, newest first.
///
/// # Errors
///
/// Returns [`DbError`] if the store query fails.
pub async fn query_markers(
    store: &dyn GeometryStore,
    filter: ComplaintFilter,
    cap: u32,
) -> Result<Vec<MarkerItem>, DbError> {
    let records = store
        .fetch_points(&PointQuery {
            filter,
            limit: cap,
            offset: 0,
        })
        .await?;

    Ok(records.into_iter().map(MarkerItem::from).collect())
}
