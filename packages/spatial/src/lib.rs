#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory complaint geometry store.
//!
//! Keeps complaint points in an R-tree and answers the [`GeometryStore`]
//! contract by envelope lookup followed by the shared filter predicate.
//! Used by tests and by local runs seeded from a `GeoJSON` file.

pub mod seed;

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use civic_map_complaint_models::ComplaintGeoRecord;
use civic_map_database::{DbError, GeometryStore};
use civic_map_database_models::{ComplaintFilter, PointQuery, RegionCountRow};
use rstar::{AABB, RTree, RTreeObject};

pub use seed::StoreLoadError;

/// A complaint stored in the R-tree, keyed by its point.
struct PointEntry {
    record: ComplaintGeoRecord,
}

impl RTreeObject for PointEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.record.longitude, self.record.latitude])
    }
}

/// [`GeometryStore`] holding every record in memory.
///
/// Writes are visible to the next query; nothing is cached between calls.
pub struct MemoryStore {
    tree: RwLock<RTree<PointEntry>>,
}

impl MemoryStore {
    /// Builds a store from the given records.
    #[must_use]
    pub fn from_records(records: Vec<ComplaintGeoRecord>) -> Self {
        let entries = records
            .into_iter()
            .map(|record| PointEntry { record })
            .collect();
        Self {
            tree: RwLock::new(RTree::bulk_load(entries)),
        }
    }

    /// Creates an empty store.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_records(Vec::new())
    }

    /// Adds a record.
    pub fn insert(&self, record: ComplaintGeoRecord) {
        let mut tree = self
            .tree
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        tree.insert(PointEntry { record });
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_tree().size()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_tree(&self) -> std::sync::RwLockReadGuard<'_, RTree<PointEntry>> {
        self.tree
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Every record matching `filter`, newest first, id descending as
    /// tie-break.
    fn matching(&self, filter: &ComplaintFilter) -> Vec<ComplaintGeoRecord> {
        let bbox = &filter.bbox;
        let envelope = AABB::from_corners([bbox.west, bbox.south], [bbox.east, bbox.north]);

        let tree = self.read_tree();
        let mut records: Vec<ComplaintGeoRecord> = tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|entry| filter.matches(&entry.record))
            .map(|entry| entry.record.clone())
            .collect();
        drop(tree);

        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        records
    }
}

#[async_trait]
impl GeometryStore for MemoryStore {
    async fn fetch_points(&self, query: &PointQuery) -> Result<Vec<ComplaintGeoRecord>, DbError> {
        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);

        Ok(self
            .matching(&query.filter)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn count(&self, filter: &ComplaintFilter) -> Result<u64, DbError> {
        Ok(self.matching(filter).len() as u64)
    }

    async fn count_by_region(
        &self,
        filter: &ComplaintFilter,
    ) -> Result<Vec<RegionCountRow>, DbError> {
        let mut regions: BTreeMap<String, RegionCountRow> = BTreeMap::new();

        for record in self.matching(filter) {
            let Some(code) = record.region_code else {
                continue;
            };
            let row = regions
                .entry(code.clone())
                .or_insert_with(|| RegionCountRow {
                    region_code: code,
                    region_name: None,
                    count: 0,
                });
            row.count += 1;
            if row.region_name.is_none() {
                row.region_name = record.region_name;
            }
        }

        Ok(regions.into_values().collect())
    }
}
