#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Viewport-driven spatial aggregation.
//!
//! Given the rectangle a map client is looking at, its zoom and a set of
//! filters, [`ViewportEngine`] returns one of several render-ready
//! projections of the matching complaints:
//!
//! * [`ViewportEngine::map_items`]: individual markers when zoomed in, grid
//!   clusters when zoomed out.
//! * [`ViewportEngine::hotspots`]: density bins for a heatmap overlay.
//! * [`ViewportEngine::districts`]: counts per administrative region.
//! * [`ViewportEngine::list`]: a paginated detail list with a total count.
//!
//! Every operation is a pure read. Nothing is cached, so identical requests
//! against an unchanged store produce identical results.

pub mod clusters;
pub mod districts;
pub mod error;
pub mod grid;
pub mod hotspots;
pub mod list;
pub mod markers;
pub mod request;
pub mod resolution;
pub mod scope;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use civic_map_database::{DbError, GeometryStore};
use civic_map_database_models::ComplaintFilter;
use civic_map_viewport_models::{
    Caller, DistrictAggregate, HotspotBin, ListItem, MapItem, PageResult, RepresentationMode,
    ViewportRequest,
};

pub use error::ViewportError;

use crate::clusters::{CLUSTER_CAP, query_clusters};
use crate::districts::to_district_aggregates;
use crate::hotspots::{HOTSPOT_CAP, query_hotspots};
use crate::list::{PageWindow, query_page};
use crate::markers::{MARKER_CAP, query_markers};
use crate::request::{ValidViewport, validate};
use crate::resolution::{hotspot_cell_size, map_resolution};
use crate::scope::resolve_scope;

/// Store timeout used when none is configured.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Answers viewport queries against a [`GeometryStore`].
#[derive(Clone)]
pub struct ViewportEngine {
    store: Arc<dyn GeometryStore>,
    timeout: Duration,
}

impl std::fmt::Debug for ViewportEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportEngine")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ViewportEngine {
    /// Creates an engine that bounds every store call by `timeout`.
    #[must_use]
    pub fn new(store: Arc<dyn GeometryStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Markers or clusters for the viewport, depending on zoom.
    ///
    /// # Errors
    ///
    /// * [`ViewportError::InvalidBounds`] / [`ViewportError::InvalidRange`]
    ///   if the request fails validation
    /// * [`ViewportError::QueryTimeout`] / [`ViewportError::QueryFailed`] if
    ///   the store does not answer
    pub async fn map_items(
        &self,
        caller: &Caller,
        request: &ViewportRequest,
    ) -> Result<Vec<MapItem>, ViewportError> {
        let (valid, filter) = prepare(caller, request)?;
        let resolution = map_resolution(valid.zoom);

        let items: Vec<MapItem> = match resolution.mode {
            RepresentationMode::Marker => {
                let cap = MARKER_CAP.resolve(valid.limit);
                self.run("markers", query_markers(self.store.as_ref(), filter, cap))
                    .await?
                    .into_iter()
                    .map(MapItem::Marker)
                    .collect()
            }
            RepresentationMode::Cluster => {
                let cap = CLUSTER_CAP.resolve(valid.limit);
                self.run(
                    "clusters",
                    query_clusters(self.store.as_ref(), filter, cap, resolution.cell_size),
                )
                .await?
                .into_iter()
                .map(MapItem::Cluster)
                .collect()
            }
        };

        log::debug!(
            "map_items: mode={} zoom={:?} items={}",
            resolution.mode,
            valid.zoom,
            items.len()
        );

        Ok(items)
    }

    /// Density bins for the viewport.
    ///
    /// # Errors
    ///
    /// Same as [`Self::map_items`].
    pub async fn hotspots(
        &self,
        caller: &Caller,
        request: &ViewportRequest,
    ) -> Result<Vec<HotspotBin>, ViewportError> {
        let (valid, filter) = prepare(caller, request)?;
        let cell_size = hotspot_cell_size(valid.zoom);
        let cap = HOTSPOT_CAP.resolve(valid.limit);

        let bins = self
            .run(
                "hotspots",
                query_hotspots(self.store.as_ref(), filter, cap, cell_size),
            )
            .await?;

        log::debug!("hotspots: cell_size={cell_size} bins={}", bins.len());

        Ok(bins)
    }

    /// Complaint counts per administrative region inside the viewport.
    ///
    /// # Errors
    ///
    /// Same as [`Self::map_items`].
    pub async fn districts(
        &self,
        caller: &Caller,
        request: &ViewportRequest,
    ) -> Result<Vec<DistrictAggregate>, ViewportError> {
        let (_, filter) = prepare(caller, request)?;

        let rows = self
            .run("districts", self.store.count_by_region(&filter))
            .await?;
        let districts = to_district_aggregates(rows);

        log::debug!("districts: regions={}", districts.len());

        Ok(districts)
    }

    /// One page of complaints in the viewport, newest first, with the total
    /// number of matching complaints.
    ///
    /// # Errors
    ///
    /// Same as [`Self::map_items`].
    pub async fn list(
        &self,
        caller: &Caller,
        request: &ViewportRequest,
        page: Option<i64>,
        size: Option<i64>,
    ) -> Result<PageResult<ListItem>, ViewportError> {
        let (_, filter) = prepare(caller, request)?;
        let window = PageWindow::resolve(page, size);

        let result = self
            .run("list", query_page(self.store.as_ref(), filter, window))
            .await?;

        log::debug!(
            "list: page={} size={} returned={} total={}",
            result.page,
            result.size,
            result.content.len(),
            result.total
        );

        Ok(result)
    }

    async fn run<T>(
        &self,
        operation: &'static str,
        query: impl Future<Output = Result<T, DbError>>,
    ) -> Result<T, ViewportError> {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => {
                log::error!("{operation} query failed: {source}");
                Err(ViewportError::QueryFailed { operation, source })
            }
            Err(_) => {
                log::warn!(
                    "{operation} query timed out after {}ms",
                    self.timeout.as_millis()
                );
                Err(ViewportError::QueryTimeout {
                    operation,
                    timeout: self.timeout,
                })
            }
        }
    }
}

fn prepare(
    caller: &Caller,
    request: &ViewportRequest,
) -> Result<(ValidViewport, ComplaintFilter), ViewportError> {
    let valid = validate(request)?;
    let scope = resolve_scope(caller, valid.requested_agency_no);
    let filter = valid.filter(&scope);
    Ok((valid, filter))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone as _, Utc};
    use civic_map_complaint_models::{CallerRole, ComplaintGeoRecord, ComplaintStatus};
    use civic_map_database_models::{PointQuery, RegionCountRow};
    use civic_map_spatial::MemoryStore;

    use crate::resolution::CLUSTER_ZOOM_THRESHOLD;

    use super::*;

    fn record(id: i64, lng: f64, lat: f64) -> ComplaintGeoRecord {
        ComplaintGeoRecord {
            id,
            category: "ROAD".to_string(),
            status: ComplaintStatus::Received,
            title: format!("Complaint {id}"),
            address: Some("Seoul".to_string()),
            longitude: lng,
            latitude: lat,
            region_code: Some("11680".to_string()),
            region_name: Some("Gangnam-gu".to_string()),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
                + ChronoDuration::minutes(id),
            agency_no: None,
            is_public: true,
            image_path: None,
        }
    }

    fn engine(records: Vec<ComplaintGeoRecord>) -> ViewportEngine {
        ViewportEngine::new(
            Arc::new(MemoryStore::from_records(records)),
            DEFAULT_QUERY_TIMEOUT,
        )
    }

    fn viewport(zoom: Option<i32>) -> ViewportRequest {
        ViewportRequest {
            sw_lat: Some(37.49),
            sw_lng: Some(126.99),
            ne_lat: Some(37.52),
            ne_lng: Some(127.02),
            zoom,
            ..ViewportRequest::default()
        }
    }

    fn three_complaints() -> Vec<ComplaintGeoRecord> {
        vec![
            record(1, 127.0, 37.5),
            record(2, 127.01, 37.51),
            record(3, 128.0, 36.0),
        ]
    }

    fn agency(no: i64) -> Caller {
        Caller {
            role: CallerRole::Agency,
            agency_no: Some(no),
        }
    }

    #[tokio::test]
    async fn zoomed_in_viewport_returns_markers_inside_it() {
        let engine = engine(three_complaints());

        let items = engine
            .map_items(&Caller::anonymous(), &viewport(Some(3)))
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        let mut ids: Vec<i64> = items
            .iter()
            .map(|item| match item {
                MapItem::Marker(m) => m.id,
                MapItem::Cluster(_) => panic!("expected markers"),
            })
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn category_filter_keeps_two_markers_of_three_complaints() {
        let mut first = record(1, 127.00, 37.50);
        first.category = "A".to_string();
        let mut second = record(2, 127.01, 37.51);
        second.category = "A".to_string();
        second.status = ComplaintStatus::Done;
        let mut third = record(3, 127.50, 37.80);
        third.category = "B".to_string();
        let engine = engine(vec![first, second, third]);

        let request = ViewportRequest {
            category: Some("A".to_string()),
            ..viewport(Some(CLUSTER_ZOOM_THRESHOLD - 1))
        };
        let items = engine
            .map_items(&Caller::anonymous(), &request)
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        for item in &items {
            let MapItem::Marker(marker) = item else {
                panic!("expected markers, got {item:?}");
            };
            assert_eq!(marker.category, "A");
            assert_ne!(marker.id, 3);
        }

        let request = ViewportRequest {
            category: Some("B".to_string()),
            ..viewport(Some(CLUSTER_ZOOM_THRESHOLD - 1))
        };
        assert!(
            engine
                .map_items(&Caller::anonymous(), &request)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn zoomed_out_viewport_returns_only_clusters() {
        let engine = engine(three_complaints());

        let items = engine
            .map_items(&Caller::anonymous(), &viewport(Some(8)))
            .await
            .unwrap();

        assert!(!items.is_empty());
        assert!(items.iter().all(|i| i.mode() == RepresentationMode::Cluster));
        let total: u64 = items
            .iter()
            .map(|i| match i {
                MapItem::Cluster(c) => c.count,
                MapItem::Marker(_) => 0,
            })
            .sum();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn marker_limit_is_respected() {
        let records = (1..=30).map(|i| record(i, 127.0, 37.5)).collect();
        let engine = engine(records);

        let request = ViewportRequest {
            limit: Some(5),
            ..viewport(Some(2))
        };
        let items = engine
            .map_items(&Caller::anonymous(), &request)
            .await
            .unwrap();
        assert_eq!(items.len(), 5);
    }

    #[tokio::test]
    async fn identical_requests_are_idempotent() {
        let records = (1..=40)
            .map(|i| {
                let step = f64::from(u8::try_from(i).unwrap()) * 0.0007;
                record(i, 126.995 + step, 37.495 + step / 2.0)
            })
            .collect();
        let engine = engine(records);
        let caller = Caller::anonymous();

        for zoom in [Some(2), Some(7), None] {
            let a = engine.map_items(&caller, &viewport(zoom)).await.unwrap();
            let b = engine.map_items(&caller, &viewport(zoom)).await.unwrap();
            assert_eq!(a, b);
        }

        let a = engine.hotspots(&caller, &viewport(Some(12))).await.unwrap();
        let b = engine.hotspots(&caller, &viewport(Some(12))).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn equal_corners_are_rejected() {
        let engine = engine(three_complaints());
        let request = ViewportRequest {
            ne_lat: Some(37.49),
            ne_lng: Some(126.99),
            ..viewport(None)
        };

        let err = engine
            .map_items(&Caller::anonymous(), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, ViewportError::InvalidBounds { .. }));
        assert!(engine.hotspots(&Caller::anonymous(), &request).await.is_err());
        assert!(engine.districts(&Caller::anonymous(), &request).await.is_err());
        assert!(
            engine
                .list(&Caller::anonymous(), &request, None, None)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn list_total_matches_count_across_filters() {
        let mut records = three_complaints();
        let mut noise = record(4, 127.005, 37.505);
        noise.category = "NOISE".to_string();
        noise.status = ComplaintStatus::Done;
        records.push(noise);
        let engine = engine(records);
        let caller = Caller::anonymous();

        let cases = [
            (viewport(None), 3),
            (
                ViewportRequest {
                    category: Some("NOISE".to_string()),
                    ..viewport(None)
                },
                1,
            ),
            (
                ViewportRequest {
                    status: Some(ComplaintStatus::Received),
                    ..viewport(None)
                },
                2,
            ),
            (
                ViewportRequest {
                    region: Some("99999".to_string()),
                    ..viewport(None)
                },
                0,
            ),
        ];

        for (request, expected) in cases {
            let page = engine.list(&caller, &request, None, None).await.unwrap();
            assert_eq!(page.total, expected);
            assert_eq!(page.content.len() as u64, expected);
        }
    }

    #[tokio::test]
    async fn list_pages_are_newest_first() {
        let records = (1..=25).map(|i| record(i, 127.0, 37.5)).collect();
        let engine = engine(records);

        let page = engine
            .list(&Caller::anonymous(), &viewport(None), Some(1), Some(10))
            .await
            .unwrap();

        assert_eq!(page.total, 25);
        assert_eq!(page.page, 1);
        assert_eq!(page.size, 10);
        let ids: Vec<i64> = page.content.iter().map(|i| i.id).collect();
        assert_eq!(ids, (6..=15).rev().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn agency_caller_is_self_scoped_unless_overridden() {
        let mut own = record(1, 127.0, 37.5);
        own.agency_no = Some(7);
        own.is_public = false;
        let mut other = record(2, 127.01, 37.51);
        other.agency_no = Some(9);
        let mut other_private = record(3, 127.01, 37.51);
        other_private.agency_no = Some(9);
        other_private.is_public = false;
        let engine = engine(vec![own, other, other_private]);

        let page = engine
            .list(&agency(7), &viewport(None), None, None)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.content[0].id, 1);

        let request = ViewportRequest {
            agency_no: Some(9),
            ..viewport(None)
        };
        let page = engine.list(&agency(7), &request, None, None).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.content[0].id, 2);

        let admin = Caller {
            role: CallerRole::Admin,
            agency_no: None,
        };
        let page = engine.list(&admin, &request, None, None).await.unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn districts_count_inside_viewport() {
        let mut jung = record(4, 127.005, 37.505);
        jung.region_code = Some("11140".to_string());
        jung.region_name = Some("Jung-gu".to_string());
        let mut records = three_complaints();
        records.push(jung);
        let engine = engine(records);

        let districts = engine
            .districts(&Caller::anonymous(), &viewport(None))
            .await
            .unwrap();

        assert_eq!(districts.len(), 2);
        assert_eq!(districts[0].region_code, "11680");
        assert_eq!(districts[0].count, 2);
        assert_eq!(districts[1].region_name, "Jung-gu");
    }

    #[tokio::test]
    async fn empty_viewport_returns_empty_collections() {
        let engine = engine(Vec::new());
        let caller = Caller::anonymous();

        assert!(engine.map_items(&caller, &viewport(None)).await.unwrap().is_empty());
        assert!(engine.map_items(&caller, &viewport(Some(9))).await.unwrap().is_empty());
        assert!(engine.hotspots(&caller, &viewport(None)).await.unwrap().is_empty());
        assert!(engine.districts(&caller, &viewport(None)).await.unwrap().is_empty());
        let page = engine.list(&caller, &viewport(None), None, None).await.unwrap();
        assert_eq!(page.total, 0);
        assert!(page.content.is_empty());
    }

    struct SlowStore;

    #[async_trait]
    impl GeometryStore for SlowStore {
        async fn fetch_points(
            &self,
            _query: &PointQuery,
        ) -> Result<Vec<ComplaintGeoRecord>, DbError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }

        async fn count(&self, _filter: &ComplaintFilter) -> Result<u64, DbError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(0)
        }

        async fn count_by_region(
            &self,
            _filter: &ComplaintFilter,
        ) -> Result<Vec<RegionCountRow>, DbError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl GeometryStore for FailingStore {
        async fn fetch_points(
            &self,
            _query: &PointQuery,
        ) -> Result<Vec<ComplaintGeoRecord>, DbError> {
            Err(DbError::Conversion {
                message: "connection reset".to_string(),
            })
        }

        async fn count(&self, _filter: &ComplaintFilter) -> Result<u64, DbError> {
            Ok(0)
        }

        async fn count_by_region(
            &self,
            _filter: &ComplaintFilter,
        ) -> Result<Vec<RegionCountRow>, DbError> {
            Err(DbError::Conversion {
                message: "connection reset".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn slow_store_times_out() {
        let engine = ViewportEngine::new(Arc::new(SlowStore), Duration::from_millis(20));

        let err = engine
            .map_items(&Caller::anonymous(), &viewport(None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ViewportError::QueryTimeout {
                operation: "markers",
                ..
            }
        ));
        assert!(!err.is_client_error());

        let err = engine
            .list(&Caller::anonymous(), &viewport(None), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ViewportError::QueryTimeout { .. }));
    }

    #[tokio::test]
    async fn store_failure_is_query_failed() {
        let engine = ViewportEngine::new(Arc::new(FailingStore), DEFAULT_QUERY_TIMEOUT);

        let err = engine
            .hotspots(&Caller::anonymous(), &viewport(None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ViewportError::QueryFailed {
                operation: "hotspots",
                ..
            }
        ));

        let err = engine
            .list(&Caller::anonymous(), &viewport(None), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ViewportError::QueryFailed { .. }));
    }
}
