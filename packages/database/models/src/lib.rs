#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Store query parameters and aggregate row types.
//!
//! These types describe what is asked of a geometry store and what comes
//! back from it. They are distinct from the API response types in
//! `civic_map_server_models` and the render-ready projections in
//! `civic_map_viewport_models`.

use chrono::{DateTime, Utc};
use civic_map_complaint_models::{ComplaintGeoRecord, ComplaintStatus};
use serde::{Deserialize, Serialize};

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Whether the point lies inside the box. Edges are inclusive, matching
    /// the `PostGIS` `&&` envelope operator for points.
    #[must_use]
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        lng >= self.west && lng <= self.east && lat >= self.south && lat <= self.north
    }
}

/// Which records the caller is allowed to see, independent of agency scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    /// Only records flagged public.
    #[default]
    PublicOnly,
    /// Public and non-public records.
    All,
}

/// The filter predicate shared by every query against the store.
///
/// The same value must be used for a content query and its count query so
/// the two can never diverge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplaintFilter {
    /// Spatial bounding box.
    pub bbox: BoundingBox,
    /// Category code.
    pub category: Option<String>,
    /// Processing status.
    pub status: Option<ComplaintStatus>,
    /// Administrative region code.
    pub region_code: Option<String>,
    /// Inclusive lower bound on creation time.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on creation time.
    pub to: Option<DateTime<Utc>>,
    /// Assigned agency.
    pub agency_no: Option<i64>,
    /// Record visibility.
    pub visibility: Visibility,
}

impl ComplaintFilter {
    /// Creates a filter that only constrains the bounding box.
    #[must_use]
    pub const fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            category: None,
            status: None,
            region_code: None,
            from: None,
            to: None,
            agency_no: None,
            visibility: Visibility::PublicOnly,
        }
    }

    /// Evaluates the predicate against a single record.
    ///
    /// Stores that cannot push the predicate down use this directly; SQL
    /// stores must produce the same result set.
    #[must_use]
    pub fn matches(&self, record: &ComplaintGeoRecord) -> bool {
        self.bbox.contains(record.longitude, record.latitude)
            && self.category.as_ref().is_none_or(|c| *c == record.category)
            && self.status.is_none_or(|s| s == record.status)
            && self
                .region_code
                .as_ref()
                .is_none_or(|r| record.region_code.as_ref() == Some(r))
            && self.from.is_none_or(|from| record.created_at >= from)
            && self.to.is_none_or(|to| record.created_at < to)
            && self.agency_no.is_none_or(|a| record.agency_no == Some(a))
            && (self.visibility == Visibility::All || record.is_public)
    }
}

/// A capped, ordered fetch of matching records.
///
/// Results are always ordered newest first with the complaint id as
/// tie-break, so identical queries return identical sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointQuery {
    /// Filter predicate.
    pub filter: ComplaintFilter,
    /// Maximum number of results to return.
    pub limit: u32,
    /// Number of results to skip.
    pub offset: u64,
}

/// Per-region count as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCountRow {
    /// Administrative region code.
    pub region_code: String,
    /// Region display name, when the directory knows it.
    pub region_name: Option<String>,
    /// Number of matching records in the region.
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    fn record(lng: f64, lat: f64) -> ComplaintGeoRecord {
        ComplaintGeoRecord {
            id: 1,
            category: "ROAD".to_string(),
            status: ComplaintStatus::Received,
            title: "Pothole".to_string(),
            address: None,
            longitude: lng,
            latitude: lat,
            region_code: Some("11680".to_string()),
            region_name: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
            agency_no: Some(7),
            is_public: true,
            image_path: None,
        }
    }

    #[test]
    fn bbox_edges_are_inclusive() {
        let bbox = BoundingBox::new(127.0, 37.0, 128.0, 38.0);
        assert!(bbox.contains(127.0, 37.0));
        assert!(bbox.contains(128.0, 38.0));
        assert!(!bbox.contains(128.000_001, 37.5));
    }

    #[test]
    fn filter_applies_every_predicate() {
        let mut filter = ComplaintFilter::new(BoundingBox::new(126.0, 37.0, 128.0, 38.0));
        let rec = record(127.0, 37.5);
        assert!(filter.matches(&rec));

        filter.category = Some("PARKING".to_string());
        assert!(!filter.matches(&rec));
        filter.category = Some("ROAD".to_string());

        filter.region_code = Some("11680".to_string());
        filter.agency_no = Some(7);
        filter.status = Some(ComplaintStatus::Received);
        assert!(filter.matches(&rec));

        filter.agency_no = Some(8);
        assert!(!filter.matches(&rec));
    }

    #[test]
    fn upper_time_bound_is_exclusive() {
        let rec = record(127.0, 37.5);
        let mut filter = ComplaintFilter::new(BoundingBox::new(126.0, 37.0, 128.0, 38.0));
        filter.from = Some(rec.created_at);
        assert!(filter.matches(&rec));
        filter.to = Some(rec.created_at);
        assert!(!filter.matches(&rec));
    }

    #[test]
    fn private_records_need_full_visibility() {
        let mut rec = record(127.0, 37.5);
        rec.is_public = false;
        let mut filter = ComplaintFilter::new(BoundingBox::new(126.0, 37.0, 128.0, 38.0));
        assert!(!filter.matches(&rec));
        filter.visibility = Visibility::All;
        assert!(filter.matches(&rec));
    }
}
