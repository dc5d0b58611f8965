//! Paginated detail list for the current viewport.

use civic_map_database::{DbError, GeometryStore};
use civic_map_database_models::{ComplaintFilter, PointQuery};
use civic_map_viewport_models::{ListItem, PageResult};

/// Page size used when the request has none.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest page size a request may ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A resolved page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Zero-based page index.
    pub page: u32,
    /// Page size.
    pub size: u32,
}

impl PageWindow {
    /// Clamps raw paging input. Negative pages become `0`, sizes are clamped
    /// into `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn resolve(page: Option<i64>, size: Option<i64>) -> Self {
        let page = page.map_or(0, |p| u32::try_from(p.max(0)).unwrap_or(u32::MAX));
        let size = size.map_or(DEFAULT_PAGE_SIZE, |s| {
            u32::try_from(s.clamp(1, i64::from(MAX_PAGE_SIZE))).unwrap_or(DEFAULT_PAGE_SIZE)
        });
        Self { page, size }
    }

    /// Number of rows skipped before this page.
    #[must_use]
    pub fn offset(self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// Fetches one page and the total matching count.
///
/// Both queries share `filter`, so `total` counts exactly the rows the
/// pages are drawn from.
///
/// # Errors
///
/// Returns [`DbError`] if either store query fails.
pub async fn query_page(
    store: &dyn GeometryStore,
    filter: ComplaintFilter,
    window: PageWindow,
) -> Result<PageResult<ListItem>, DbError> {
    let query = PointQuery {
        filter,
        limit: window.size,
        offset: window.offset(),
    };

    let (records, total) =
        futures::future::try_join(store.fetch_points(&query), store.count(&query.filter)).await?;

    Ok(PageResult {
        content: records.into_iter().map(ListItem::from).collect(),
        page: window.page,
        size: window.size,
        total,
    })
}
