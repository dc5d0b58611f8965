//! Loads a [`MemoryStore`] from a `GeoJSON` `FeatureCollection`.
//!
//! Each feature must carry a `Point` geometry. Properties map onto
//! [`ComplaintGeoRecord`] fields in camelCase; `isPublic` defaults to
//! `true`.

use std::path::Path;

use chrono::{DateTime, Utc};
use civic_map_complaint_models::{ComplaintGeoRecord, ComplaintStatus};
use geojson::GeoJson;
use serde::Deserialize;

use crate::MemoryStore;

/// Errors that can occur while loading seed data.
#[derive(Debug, thiserror::Error)]
pub enum StoreLoadError {
    /// I/O error reading the seed file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not valid `GeoJSON`.
    #[error("GeoJSON parse error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// A feature's properties don't describe a complaint.
    #[error("Invalid properties on feature {index}: {source}")]
    Properties {
        /// Position of the feature in the collection.
        index: usize,
        /// Underlying deserialization error.
        source: serde_json::Error,
    },

    /// Structural problem with the document.
    #[error("Invalid seed data: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedProperties {
    id: i64,
    category: String,
    status: ComplaintStatus,
    title: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    region_code: Option<String>,
    #[serde(default)]
    region_name: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    agency_no: Option<i64>,
    #[serde(default = "default_true")]
    is_public: bool,
    #[serde(default)]
    image_path: Option<String>,
}

impl MemoryStore {
    /// Parses a `GeoJSON` `FeatureCollection` into a store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreLoadError`] if the document is not a feature
    /// collection, a feature lacks a point geometry, or its properties are
    /// incomplete.
    pub fn from_geojson_str(input: &str) -> Result<Self, StoreLoadError> {
        let records = parse_feature_collection(input)?;
        log::info!("Loaded {} complaints into memory store", records.len());
        Ok(Self::from_records(records))
    }

    /// Reads and parses a `GeoJSON` seed file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreLoadError`] if the file cannot be read or parsed.
    pub fn from_geojson_file(path: &Path) -> Result<Self, StoreLoadError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&input)
    }
}

fn parse_feature_collection(input: &str) -> Result<Vec<ComplaintGeoRecord>, StoreLoadError> {
    let GeoJson::FeatureCollection(collection) = input.parse::<GeoJson>()? else {
        return Err(StoreLoadError::Invalid {
            message: "expected a FeatureCollection".to_string(),
        });
    };

    let mut records = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            return Err(StoreLoadError::Invalid {
                message: format!("feature {index} has no geometry"),
            });
        };

        let geo::Geometry::Point(point) = geo::Geometry::<f64>::try_from(geometry)? else {
            return Err(StoreLoadError::Invalid {
                message: format!("feature {index} is not a Point"),
            });
        };

        let properties = serde_json::Value::Object(feature.properties.unwrap_or_default());
        let props: SeedProperties = serde_json::from_value(properties)
            .map_err(|source| StoreLoadError::Properties { index, source })?;

        records.push(ComplaintGeoRecord {
            id: props.id,
            category: props.category,
            status: props.status,
            title: props.title,
            address: props.address,
            longitude: point.x(),
            latitude: point.y(),
            region_code: props.region_code,
            region_name: props.region_name,
            created_at: props.created_at,
            agency_no: props.agency_no,
            is_public: props.is_public,
            image_path: props.image_path,
        });
    }

    Ok(records)
}
