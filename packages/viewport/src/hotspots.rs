//! Density bins for heatmap overlays.

use std::cmp::Reverse;

use civic_map_complaint_models::ComplaintGeoRecord;
use civic_map_database::{DbError, GeometryStore};
use civic_map_database_models::{ComplaintFilter, PointQuery};
use civic_map_viewport_models::{HotspotBin, LatLng};

use crate::grid::group_by_cell;
use crate::request::CapPolicy;

/// Working-set cap for hotspot binning: 20,000 by default, at most 50,000.
pub const HOTSPOT_CAP: CapPolicy = CapPolicy {
    default: 20_000,
    max: 50_000,
};

/// Maximum number of member coordinates carried by a bin.
pub const HOTSPOT_SAMPLE_SIZE: usize = 20;

/// Fetches the capped working set and bins it.
///
/// # Errors
///
/// Returns [`DbError`] if the store query fails.
pub async fn query_hotspots(
    store: &dyn GeometryStore,
    filter: ComplaintFilter,
    cap: u32,
    cell_size: f64,
) -> Result<Vec<HotspotBin>, DbError> {
    let records = store
        .fetch_points(&PointQuery {
            filter,
            limit: cap,
            offset: 0,
        })
        .await?;

    if records.len() >= cap as usize {
        log::warn!("Hotspot working set hit the cap of {cap} records");
    }

    Ok(bin_hotspots(&records, cell_size))
}

/// Bins `records` on a grid of `cell_size` degrees.
///
/// Bins are ordered densest first, ties by ascending cell id.
#[must_use]
pub fn bin_hotspots(records: &[ComplaintGeoRecord], cell_size: f64) -> Vec<HotspotBin> {
    let mut bins: Vec<HotspotBin> = group_by_cell(records, cell_size)
        .into_iter()
        .map(|(cell, members)| {
            let (lat, lng) = cell.corner(cell_size);
            HotspotBin {
                cell_id: format!("{lat:.6}_{lng:.6}"),
                count: members.len() as u64,
                points: members
                    .iter()
                    .take(HOTSPOT_SAMPLE_SIZE)
                    .map(|r| LatLng {
                        lat: r.latitude,
                        lng: r.longitude,
                    })
                    .collect(),
            }
        })
        .collect();

    bins.sort_by(|a, b| {
        Reverse(a.count)
            .cmp(&Reverse(b.count))
            .then_with(|| a.cell_id.cmp(&b.cell_id))
    });
    bins
}
