//! Per-region complaint counts.

use std::cmp::Reverse;

use civic_map_database_models::RegionCountRow;
use civic_map_viewport_models::DistrictAggregate;

/// Converts store rows into aggregates, largest count first.
///
/// Regions without a display name fall back to their code. Equal counts are
/// ordered by code.
#[must_use]
pub fn to_district_aggregates(rows: Vec<RegionCountRow>) -> Vec<DistrictAggregate> {
    let mut districts: Vec<DistrictAggregate> = rows
        .into_iter()
        .map(|row| DistrictAggregate {
            region_name: row
                .region_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| row.region_code.clone()),
            region_code: row.region_code,
            count: row.count,
        })
        .collect();

    districts.sort_by(|a, b| {
        Reverse(a.count)
            .cmp(&Reverse(b.count))
            .then_with(|| a.region_code.cmp(&b.region_code))
    });
    districts
}
