//! Zoom level to representation mode and grid cell size.
//!
//! Two independent tiers live here. The marker/cluster switch reads zoom as
//! a map level where larger numbers are further zoomed out. Hotspot sizing
//! reads zoom the web-map way: larger numbers are closer in, so cells get
//! finer as zoom grows.

use civic_map_viewport_models::RepresentationMode;

/// Smallest accepted zoom.
pub const MIN_ZOOM: i32 = 1;
/// Largest accepted zoom.
pub const MAX_ZOOM: i32 = 20;

/// Map level at and above which `/map-items` switches to clusters.
pub const CLUSTER_ZOOM_THRESHOLD: i32 = 6;

/// Map level assumed when the request has no zoom.
pub const DEFAULT_MAP_ZOOM: i32 = 5;

/// Hotspot zoom assumed when the request has no zoom.
pub const DEFAULT_HOTSPOT_ZOOM: i32 = 10;

/// Hotspot tiers as `(minimum zoom, cell size in degrees)`, ascending by zoom.
const HOTSPOT_TIERS: &[(i32, f64)] = &[
    (MIN_ZOOM, 0.04),
    (6, 0.02),
    (8, 0.01),
    (10, 0.005),
    (12, 0.002),
    (14, 0.001),
    (16, 0.0005),
    (18, 0.0001),
];

/// Clamps a zoom into `MIN_ZOOM..=MAX_ZOOM`.
#[must_use]
pub fn clamp_zoom(zoom: i32) -> i32 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Representation and cell size chosen for `/map-items`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapResolution {
    /// Markers or clusters.
    pub mode: RepresentationMode,
    /// Cluster grid cell size in degrees.
    pub cell_size: f64,
}

/// Resolves the `/map-items` representation for `zoom`.
#[must_use]
pub fn map_resolution(zoom: Option<i32>) -> MapResolution {
    let level = clamp_zoom(zoom.unwrap_or(DEFAULT_MAP_ZOOM));
    let mode = if level >= CLUSTER_ZOOM_THRESHOLD {
        RepresentationMode::Cluster
    } else {
        RepresentationMode::Marker
    };

    let cell_size = match level {
        ..=3 => 0.005,
        4..=5 => 0.01,
        6..=7 => 0.02,
        _ => 0.04,
    };

    MapResolution { mode, cell_size }
}

/// Hotspot grid cell size in degrees for `zoom`.
#[must_use]
pub fn hotspot_cell_size(zoom: Option<i32>) -> f64 {
    let zoom = clamp_zoom(zoom.unwrap_or(DEFAULT_HOTSPOT_ZOOM));
    HOTSPOT_TIERS
        .iter()
        .rev()
        .find(|(min_zoom, _)| zoom >= *min_zoom)
        .map_or(HOTSPOT_TIERS[0].1, |(_, size)| *size)
}
