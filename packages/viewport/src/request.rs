//! Validation of incoming viewport requests.

use chrono::{DateTime, Utc};
use civic_map_complaint_models::ComplaintStatus;
use civic_map_database_models::{BoundingBox, ComplaintFilter};
use civic_map_viewport_models::ViewportRequest;

use crate::ViewportError;
use crate::resolution::clamp_zoom;
use crate::scope::EffectiveScope;

/// Absolute ceiling on any requested result cap.
pub const MAX_RESULT_CAP: u32 = 50_000;

/// Default and hard maximum result cap for one kind of query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapPolicy {
    /// Cap used when the request doesn't ask for one.
    pub default: u32,
    /// Largest cap a request may ask for.
    pub max: u32,
}

impl CapPolicy {
    /// Resolves the requested cap against this policy.
    #[must_use]
    pub fn resolve(self, requested: Option<u32>) -> u32 {
        requested.map_or(self.default, |limit| limit.min(self.max))
    }
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidViewport {
    /// Viewport rectangle.
    pub bbox: BoundingBox,
    /// Zoom, clamped into the valid range.
    pub zoom: Option<i32>,
    /// Category code.
    pub category: Option<String>,
    /// Processing status.
    pub status: Option<ComplaintStatus>,
    /// Region code.
    pub region: Option<String>,
    /// Inclusive lower bound on creation time.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on creation time.
    pub to: Option<DateTime<Utc>>,
    /// Requested cap, clamped to [`MAX_RESULT_CAP`].
    pub limit: Option<u32>,
    /// Agency filter exactly as the caller supplied it.
    pub requested_agency_no: Option<i64>,
}

impl ValidViewport {
    /// Builds the store filter for this viewport under `scope`.
    #[must_use]
    pub fn filter(&self, scope: &EffectiveScope) -> ComplaintFilter {
        ComplaintFilter {
            bbox: self.bbox,
            category: self.category.clone(),
            status: self.status,
            region_code: self.region.clone(),
            from: self.from,
            to: self.to,
            agency_no: scope.agency_no,
            visibility: scope.visibility,
        }
    }
}

/// Validates a raw request.
///
/// # Errors
///
/// * [`ViewportError::InvalidBounds`] if a corner is missing, not finite,
///   outside WGS84 ranges, or the southwest corner is not strictly southwest
///   of the northeast corner.
/// * [`ViewportError::InvalidRange`] if `from` is after `to`.
pub fn validate(request: &ViewportRequest) -> Result<ValidViewport, ViewportError> {
    let (Some(sw_lat), Some(sw_lng), Some(ne_lat), Some(ne_lng)) = (
        request.sw_lat,
        request.sw_lng,
        request.ne_lat,
        request.ne_lng,
    ) else {
        return Err(ViewportError::bounds(
            "swLat, swLng, neLat and neLng are required",
        ));
    };

    if ![sw_lat, sw_lng, ne_lat, ne_lng].iter().all(|v| v.is_finite()) {
        return Err(ViewportError::bounds("coordinates must be finite numbers"));
    }

    if !(-90.0..=90.0).contains(&sw_lat) || !(-90.0..=90.0).contains(&ne_lat) {
        return Err(ViewportError::bounds("latitude must be within [-90, 90]"));
    }

    if !(-180.0..=180.0).contains(&sw_lng) || !(-180.0..=180.0).contains(&ne_lng) {
        return Err(ViewportError::bounds("longitude must be within [-180, 180]"));
    }

    if sw_lat >= ne_lat || sw_lng >= ne_lng {
        return Err(ViewportError::bounds(format!(
            "southwest ({sw_lat}, {sw_lng}) must be strictly southwest of northeast ({ne_lat}, {ne_lng})"
        )));
    }

    if let (Some(from), Some(to)) = (request.from, request.to)
        && from > to
    {
        return Err(ViewportError::range(format!(
            "from ({from}) is after to ({to})"
        )));
    }

    let limit = request
        .limit
        .filter(|&l| l > 0)
        .map(|l| u32::try_from(l).unwrap_or(u32::MAX).min(MAX_RESULT_CAP));

    Ok(ValidViewport {
        bbox: BoundingBox::new(sw_lng, sw_lat, ne_lng, ne_lat),
        zoom: request.zoom.map(clamp_zoom),
        category: non_blank(request.category.as_deref()),
        status: request.status,
        region: non_blank(request.region.as_deref()),
        from: request.from,
        to: request.to,
        limit,
        requested_agency_no: request.agency_no,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
