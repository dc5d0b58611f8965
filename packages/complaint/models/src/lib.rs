#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Complaint status, caller role and geotagged complaint record types.
//!
//! The complaint lifecycle (submission, triage, status transitions) is owned
//! elsewhere. This crate only describes the read-only shape the spatial
//! engine consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Processing status of a complaint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ComplaintStatus {
    /// Submitted and waiting for triage
    Received,
    /// Assigned to an agency and being worked on
    InProgress,
    /// Answered and closed
    Done,
    /// Rejected by the assigned agency
    Rejected,
    /// Withdrawn by the citizen
    Cancelled,
}

impl ComplaintStatus {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Received,
            Self::InProgress,
            Self::Done,
            Self::Rejected,
            Self::Cancelled,
        ]
    }
}

/// Role of the caller as decided by the authenticating gateway.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum CallerRole {
    /// No authenticated session
    #[default]
    Anonymous,
    /// Registered citizen
    Citizen,
    /// Staff member of a handling agency
    Agency,
    /// Portal administrator
    Admin,
}

/// A complaint projected onto its point geometry.
///
/// Coordinates are WGS84 (EPSG:4326) degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintGeoRecord {
    /// Complaint number.
    pub id: i64,
    /// Category code (e.g. `"ROAD"`, `"PARKING"`).
    pub category: String,
    /// Current processing status.
    pub status: ComplaintStatus,
    /// Short title.
    pub title: String,
    /// Free-text address.
    pub address: Option<String>,
    /// Longitude.
    pub longitude: f64,
    /// Latitude.
    pub latitude: f64,
    /// Administrative region (district) code.
    pub region_code: Option<String>,
    /// Administrative region display name.
    pub region_name: Option<String>,
    /// When the complaint was submitted.
    pub created_at: DateTime<Utc>,
    /// Agency the complaint is assigned to.
    pub agency_no: Option<i64>,
    /// Whether the complaint is visible to the public.
    pub is_public: bool,
    /// Stored image path, if an image was attached.
    pub image_path: Option<String>,
}
