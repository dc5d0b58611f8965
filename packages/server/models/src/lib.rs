#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the civic map server.
//!
//! Query parameter structs mirror the wire names used by map clients. They
//! are converted into [`ViewportRequest`] before reaching the engine so the
//! wire contract can change independently of the engine's input type.

use chrono::{DateTime, Utc};
use civic_map_complaint_models::ComplaintStatus;
use civic_map_viewport_models::ViewportRequest;
use serde::{Deserialize, Deserializer, Serialize};

/// Query parameters shared by every `/api/gis` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportQueryParams {
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
    /// Processing status (`RECEIVED`, `IN_PROGRESS`, ...), any case.
    #[serde(default, deserialize_with = "deserialize_status")]
    pub status: Option<ComplaintStatus>,
    /// Administrative region code. Older clients send `adminCode`.
    #[serde(alias = "adminCode")]
    pub region: Option<String>,
    /// Start of the creation time range (RFC 3339).
    pub from: Option<DateTime<Utc>>,
    /// End of the creation time range (RFC 3339), exclusive.
    pub to: Option<DateTime<Utc>>,
    /// Maximum number of results.
    pub limit: Option<i64>,
    /// Agency filter.
    pub agency_no: Option<i64>,
    /// Zero-based page index (list endpoint only).
    pub page: Option<i64>,
    /// Page size (list endpoint only).
    pub size: Option<i64>,
}

fn deserialize_status<'de, D>(deserializer: D) -> Result<Option<ComplaintStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|value| value.trim().parse().map_err(serde::de::Error::custom))
        .transpose()
}

impl From<ViewportQueryParams> for ViewportRequest {
    fn from(params: ViewportQueryParams) -> Self {
        Self {
            sw_lat: params.sw_lat,
            sw_lng: params.sw_lng,
            ne_lat: params.ne_lat,
            ne_lng: params.ne_lng,
            zoom: params.zoom,
            category: params.category,
            status: params.status,
            region: params.region,
            from: params.from,
            to: params.to,
            limit: params.limit,
            agency_no: params.agency_no,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}
