//! Grid clusters for zoomed-out views.
//!
//! The capped working set is snapped to a square grid. Each non-empty cell
//! becomes one cluster positioned at the true centroid of its members, keyed
//! by the WKT envelope of those members so a client can re-query exactly
//! that area at a finer zoom.

use civic_map_complaint_models::ComplaintGeoRecord;
use civic_map_database::{DbError, GeometryStore};
use civic_map_database_models::{ComplaintFilter, PointQuery};
use civic_map_viewport_models::ClusterItem;
use geo::{BoundingRect as _, Centroid as _, MultiPoint, Point, Rect};

use crate::grid::group_by_cell;
use crate::request::CapPolicy;

/// Working-set cap for clustering: 20,000 by default, at most 50,000.
pub const CLUSTER_CAP: CapPolicy = CapPolicy {
    default: 20_000,
    max: 50_000,
};

/// Fetches the capped working set and clusters it.
///
/// When the cap is reached the clusters describe only the capped working
/// set, so very dense scenes undercount.
///
/// # Errors
///
/// Returns [`DbError`] if the store query fails.
pub async fn query_clusters(
    store: &dyn GeometryStore,
    filter: ComplaintFilter,
    cap: u32,
    cell_size: f64,
) -> Result<Vec<ClusterItem>, DbError> {
    let records = store
        .fetch_points(&PointQuery {
            filter,
            limit: cap,
            offset: 0,
        })
        .await?;

    if records.len() >= cap as usize {
        log::warn!(
            "Cluster working set hit the cap of {cap} records; dense cells may undercount"
        );
    }

    Ok(aggregate_clusters(&records, cell_size))
}

/// Clusters `records` on a grid of `cell_size` degrees.
///
/// Output is ordered by cell (latitude index, then longitude index).
#[must_use]
pub fn aggregate_clusters(records: &[ComplaintGeoRecord], cell_size: f64) -> Vec<ClusterItem> {
    group_by_cell(records, cell_size)
        .into_values()
        .filter_map(|members| {
            let points: MultiPoint<f64> = members
                .iter()
                .map(|r| Point::new(r.longitude, r.latitude))
                .collect();
            let centroid = points.centroid()?;
            let envelope = points.bounding_rect()?;

            Some(ClusterItem {
                lat: centroid.y(),
                lng: centroid.x(),
                count: members.len() as u64,
                cluster_key: envelope_wkt(&envelope),
            })
        })
        .collect()
}

/// Renders an envelope as WKT.
///
/// A single location renders as `POINT`, a horizontal or vertical spread as
/// `LINESTRING`, anything else as a closed `POLYGON` ring.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn envelope_wkt(rect: &Rect<f64>) -> String {
    let (min, max) = (rect.min(), rect.max());

    if min.x == max.x && min.y == max.y {
        return format!("POINT({} {})", min.x, min.y);
    }

    if min.x == max.x || min.y == max.y {
        return format!("LINESTRING({} {},{} {})", min.x, min.y, max.x, max.y);
    }

    format!(
        "POLYGON(({x0} {y0},{x0} {y1},{x1} {y1},{x1} {y0},{x0} {y0}))",
        x0 = min.x,
        y0 = min.y,
        x1 = max.x,
        y1 = max.y,
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};
    use civic_map_complaint_models::ComplaintStatus;
    use geo::coord;

    use super::*;

    fn record(id: i64, lng: f64, lat: f64) -> ComplaintGeoRecord {
        ComplaintGeoRecord {
            id,
            category: "ROAD".to_string(),
            status: ComplaintStatus::Received,
            title: String::new(),
            address: None,
            longitude: lng,
            latitude: lat,
            region_code: None,
            region_name: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            agency_no: None,
            is_public: true,
            image_path: None,
        }
    }

    #[test]
    fn members_of_one_cell_collapse_to_their_centroid() {
        let records = vec![
            record(1, 127.001, 37.501),
            record(2, 127.003, 37.503),
            record(3, 127.005, 37.505),
        ];

        let clusters = aggregate_clusters(&records, 0.02);
        assert_eq!(clusters.len(), 1);

        let c = &clusters[0];
        assert_eq!(c.count, 3);
        assert!((c.lat - 37.503).abs() < 1e-9);
        assert!((c.lng - 127.003).abs() < 1e-9);
        assert_eq!(
            c.cluster_key,
            "POLYGON((127.001 37.501,127.001 37.505,127.005 37.505,127.005 37.501,127.001 37.501))"
        );
    }

    #[test]
    fn counts_sum_to_working_set_size() {
        let records: Vec<ComplaintGeoRecord> = (0..97)
            .map(|i| {
                let offset = f64::from(i) * 0.0037;
                record(i64::from(i), 127.0 + offset, 37.4 + offset / 2.0)
            })
            .collect();

        let clusters = aggregate_clusters(&records, 0.02);
        let total: u64 = clusters.iter().map(|c| c.count).sum();
        assert_eq!(total, 97);
        assert!(clusters.len() > 1);
    }

    #[test]
    fn centroid_is_not_the_cell_corner() {
        let clusters = aggregate_clusters(&[record(1, 127.013, 37.517)], 0.02);
        assert_eq!(clusters.len(), 1);
        assert!((clusters[0].lat - 37.517).abs() < 1e-9);
        assert!((clusters[0].lng - 127.013).abs() < 1e-9);
        assert_eq!(clusters[0].cluster_key, "POINT(127.013 37.517)");
    }

    #[test]
    fn identical_input_produces_identical_clusters() {
        let records: Vec<ComplaintGeoRecord> = (0..50)
            .map(|i| record(i64::from(i), 127.0 + f64::from(i) * 0.011, 37.5))
            .collect();
        assert_eq!(
            aggregate_clusters(&records, 0.04),
            aggregate_clusters(&records, 0.04)
        );
    }

    #[test]
    fn empty_input_has_no_clusters() {
        assert!(aggregate_clusters(&[], 0.02).is_empty());
    }

    #[test]
    fn degenerate_envelopes() {
        let line = Rect::new(coord! { x: 127.0, y: 37.5 }, coord! { x: 127.5, y: 37.5 });
        assert_eq!(envelope_wkt(&line), "LINESTRING(127 37.5,127.5 37.5)");
    }
}
