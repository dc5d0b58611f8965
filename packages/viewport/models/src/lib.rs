#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Viewport request and render-ready projection types.
//!
//! A [`ViewportRequest`] is the untrusted, not yet validated description of
//! what the map is looking at. Everything else in this crate is a read-only
//! projection computed per request.

use chrono::{DateTime, Utc};
use civic_map_complaint_models::{CallerRole, ComplaintGeoRecord, ComplaintStatus};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// The spatial, filter and paging query issued by a map client.
///
/// Corners are optional here so that a missing corner can be reported as
/// invalid bounds rather than a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportRequest {
    /// Southwest latitude.
    pub sw_lat: Option<f64>,
    /// Southwest longitude.
    pub sw_lng: Option<f64>,
    /// Northeast latitude.
    pub ne_lat: Option<f64>,
    /// Northeast longitude.
    pub ne_lng: Option<f64>,
    /// Map zoom level.
    pub zoom: Option<i32>,
    /// Category code.
    pub category: Option<String>,
    /// Processing status.
    pub status: Option<ComplaintStatus>,
    /// Administrative region code.
    pub region: Option<String>,
    /// Inclusive lower bound on creation time.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on creation time.
    pub to: Option<DateTime<Utc>>,
    /// Requested result cap.
    pub limit: Option<i64>,
    /// Agency filter as supplied by the caller.
    pub agency_no: Option<i64>,
}

/// Who is asking, as decided by the authentication layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    /// Caller role.
    pub role: CallerRole,
    /// Agency the caller belongs to (agency-role callers only).
    pub agency_no: Option<i64>,
}

impl Caller {
    /// An unauthenticated caller.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            role: CallerRole::Anonymous,
            agency_no: None,
        }
    }
}

/// How `/map-items` represents complaints at a given zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RepresentationMode {
    /// One item per complaint.
    Marker,
    /// One item per grid cell.
    Cluster,
}

/// A single complaint rendered as one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerItem {
    /// Complaint number.
    pub id: i64,
    /// Category code.
    pub category: String,
    /// Processing status.
    pub status: ComplaintStatus,
    /// Short title.
    pub title: String,
    /// Free-text address.
    pub address: Option<String>,
    /// Stored image path.
    pub image_path: Option<String>,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

impl From<ComplaintGeoRecord> for MarkerItem {
    fn from(record: ComplaintGeoRecord) -> Self {
        Self {
            id: record.id,
            category: record.category,
            status: record.status,
            title: record.title,
            address: record.address,
            image_path: record.image_path,
            lat: record.latitude,
            lng: record.longitude,
        }
    }
}

/// Aggregate over one grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterItem {
    /// Centroid latitude of the members.
    pub lat: f64,
    /// Centroid longitude of the members.
    pub lng: f64,
    /// Number of members.
    pub count: u64,
    /// WKT of the members' combined envelope. Clients pass it back as a
    /// viewport to drill into the cell.
    pub cluster_key: String,
}

/// An item on the map: either a marker or a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MapItem {
    /// Single complaint.
    Marker(MarkerItem),
    /// Grid cluster.
    Cluster(ClusterItem),
}

impl MapItem {
    /// The representation this item belongs to.
    #[must_use]
    pub const fn mode(&self) -> RepresentationMode {
        match self {
            Self::Marker(_) => RepresentationMode::Marker,
            Self::Cluster(_) => RepresentationMode::Cluster,
        }
    }
}

/// A coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

/// A density cell for heatmap rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotBin {
    /// Identifier derived from the grid-snapped cell corner.
    pub cell_id: String,
    /// Number of members.
    pub count: u64,
    /// Bounded sample of member coordinates.
    pub points: Vec<LatLng>,
}

/// Complaint count for one administrative region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictAggregate {
    /// Region code.
    pub region_code: String,
    /// Region display name.
    pub region_name: String,
    /// Number of matching complaints.
    pub count: u64,
}

/// One row of the viewport detail list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    /// Complaint number.
    pub id: i64,
    /// Category code.
    pub category: String,
    /// Short title.
    pub title: String,
    /// Processing status.
    pub status: ComplaintStatus,
    /// When the complaint was submitted.
    pub created_at: DateTime<Utc>,
    /// Free-text address.
    pub address: Option<String>,
    /// Region code.
    pub region_code: Option<String>,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Stored image path.
    pub image_path: Option<String>,
}

impl From<ComplaintGeoRecord> for ListItem {
    fn from(record: ComplaintGeoRecord) -> Self {
        Self {
            id: record.id,
            category: record.category,
            title: record.title,
            status: record.status,
            created_at: record.created_at,
            address: record.address,
            region_code: record.region_code,
            lat: record.latitude,
            lng: record.longitude,
            image_path: record.image_path,
        }
    }
}

/// A page of results with the total matching count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    /// Items on this page.
    pub content: Vec<T>,
    /// Zero-based page index.
    pub page: u32,
    /// Page size.
    pub size: u32,
    /// Number of records matching the filter across all pages.
    #[serde(rename = "totalCount")]
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_items_are_tagged_by_type() {
        let marker = MapItem::Marker(MarkerItem {
            id: 5,
            category: "ROAD".to_string(),
            status: ComplaintStatus::Received,
            title: "Pothole".to_string(),
            address: None,
            image_path: None,
            lat: 37.5,
            lng: 127.0,
        });
        let json = serde_json::to_value(&marker).unwrap();
        assert_eq!(json["type"], "MARKER");
        assert_eq!(json["status"], "RECEIVED");
        assert_eq!(marker.mode(), RepresentationMode::Marker);

        let cluster = MapItem::Cluster(ClusterItem {
            lat: 37.5,
            lng: 127.0,
            count: 3,
            cluster_key: "POINT(127 37.5)".to_string(),
        });
        let json = serde_json::to_value(&cluster).unwrap();
        assert_eq!(json["type"], "CLUSTER");
        assert_eq!(json["clusterKey"], "POINT(127 37.5)");
    }

    #[test]
    fn page_total_is_sent_as_total_count() {
        let page: PageResult<()> = PageResult {
            content: Vec::new(),
            page: 0,
            size: 20,
            total: 21,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalCount"], 21);
        assert!(json.get("total").is_none());
    }
}
