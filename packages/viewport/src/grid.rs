//! Grid snapping shared by the cluster and hotspot aggregators.

use std::collections::BTreeMap;

use civic_map_complaint_models::ComplaintGeoRecord;

/// A grid cell identified by integer indices on each axis.
///
/// Ordered by latitude index, then longitude index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridCell {
    /// `floor(lat / cell_size)`.
    pub lat_idx: i64,
    /// `floor(lng / cell_size)`.
    pub lng_idx: i64,
}

impl GridCell {
    /// Snaps a coordinate to its cell.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn snap(lng: f64, lat: f64, cell_size: f64) -> Self {
        Self {
            lat_idx: (lat / cell_size).floor() as i64,
            lng_idx: (lng / cell_size).floor() as i64,
        }
    }

    /// Southwest corner of the cell as `(lat, lng)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn corner(self, cell_size: f64) -> (f64, f64) {
        (
            self.lat_idx as f64 * cell_size,
            self.lng_idx as f64 * cell_size,
        )
    }
}

/// Groups records by cell, preserving each cell's input order.
#[must_use]
pub fn group_by_cell(
    records: &[ComplaintGeoRecord],
    cell_size: f64,
) -> BTreeMap<GridCell, Vec<&ComplaintGeoRecord>> {
    let mut cells: BTreeMap<GridCell, Vec<&ComplaintGeoRecord>> = BTreeMap::new();
    for record in records {
        cells
            .entry(GridCell::snap(record.longitude, record.latitude, cell_size))
            .or_default()
            .push(record);
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_floors_on_both_axes() {
        let cell = GridCell::snap(127.013, 37.507, 0.01);
        assert_eq!(cell.lat_idx, 3750);
        assert_eq!(cell.lng_idx, 12701);
    }

    #[test]
    fn snap_floors_negative_coordinates_downward() {
        let cell = GridCell::snap(-0.004, -0.004, 0.01);
        assert_eq!(cell, GridCell { lat_idx: -1, lng_idx: -1 });
    }

    #[test]
    fn same_input_same_cell() {
        let a = GridCell::snap(126.978_12, 37.566_53, 0.005);
        let b = GridCell::snap(126.978_12, 37.566_53, 0.005);
        assert_eq!(a, b);
    }

    #[test]
    fn corner_is_southwest_of_members() {
        let size = 0.02;
        let (lat, lng) = GridCell::snap(127.013, 37.507, size).corner(size);
        assert!(lat <= 37.507 && 37.507 - lat < size);
        assert!(lng <= 127.013 && 127.013 - lng < size);
    }
}
