//! `PostGIS` implementation of [`GeometryStore`].
//!
//! Expects the complaint service's schema: `complaint` (one row per
//! complaint), `spatial_feature` (the complaint's geometry, address and
//! region code) and `admin_region` (region code to display name).
//!
//! All three queries share [`FilterSql`], so a content query and its count
//! query are always built from the identical predicate.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use civic_map_complaint_models::{ComplaintGeoRecord, ComplaintStatus};
use civic_map_database_models::{ComplaintFilter, PointQuery, RegionCountRow, Visibility};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::{DbError, GeometryStore};

const FROM_CLAUSE: &str = "
         FROM complaint c
         JOIN spatial_feature sf ON sf.complaint_no = c.complaint_no";

/// A `WHERE` clause and its bound parameters.
///
/// Each active filter appends one predicate and one parameter; filter values
/// are never interpolated into the SQL text.
#[derive(Debug, Clone)]
pub struct FilterSql {
    fragments: Vec<String>,
    params: Vec<DatabaseValue>,
    next_idx: u32,
}

impl FilterSql {
    /// Builds the predicate for `filter`.
    #[must_use]
    pub fn build(filter: &ComplaintFilter) -> Self {
        let mut sql = Self {
            fragments: vec!["sf.feature_type = 'POINT'".to_string()],
            params: Vec::new(),
            next_idx: 1,
        };

        let bbox = &filter.bbox;
        let i = sql.next_idx;
        sql.fragments.push(format!(
            "sf.geom && ST_MakeEnvelope(${}, ${}, ${}, ${}, 4326)",
            i,
            i + 1,
            i + 2,
            i + 3,
        ));
        sql.params.extend([
            DatabaseValue::Real64(bbox.west),
            DatabaseValue::Real64(bbox.south),
            DatabaseValue::Real64(bbox.east),
            DatabaseValue::Real64(bbox.north),
        ]);
        sql.next_idx += 4;

        if let Some(category) = &filter.category {
            sql.push("c.category = ${}", DatabaseValue::String(category.clone()));
        }

        if let Some(status) = filter.status {
            // complaint.status is the `complaint_status` enum type
            sql.push(
                "c.status = CAST(${} AS complaint_status)",
                DatabaseValue::String(status.as_ref().to_string()),
            );
        }

        if let Some(region) = &filter.region_code {
            sql.push("sf.admin_code = ${}", DatabaseValue::String(region.clone()));
        }

        if let Some(from) = &filter.from {
            sql.push(
                "c.created_date >= ${}",
                DatabaseValue::DateTime(from.naive_utc()),
            );
        }

        if let Some(to) = &filter.to {
            sql.push(
                "c.created_date < ${}",
                DatabaseValue::DateTime(to.naive_utc()),
            );
        }

        if let Some(agency_no) = filter.agency_no {
            sql.push(
                "c.assigned_agency_no = ${}",
                DatabaseValue::Int64(agency_no),
            );
        }

        if filter.visibility == Visibility::PublicOnly {
            sql.fragments.push("c.is_public = TRUE".to_string());
        }

        sql
    }

    /// Appends `fragment` with its single `${}` placeholder replaced by the
    /// next parameter index.
    fn push(&mut self, fragment: &str, value: DatabaseValue) {
        self.fragments
            .push(fragment.replacen("${}", &format!("${}", self.next_idx), 1));
        self.params.push(value);
        self.next_idx += 1;
    }

    /// The rendered ` WHERE ...` clause.
    #[must_use]
    pub fn where_clause(&self) -> String {
        format!(" WHERE {}", self.fragments.join(" AND "))
    }

    /// Bound parameters, in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[DatabaseValue] {
        &self.params
    }

    /// Index of the next free placeholder.
    #[must_use]
    pub const fn next_idx(&self) -> u32 {
        self.next_idx
    }
}

/// Renders the point fetch query for `query`.
#[must_use]
pub fn point_query_sql(query: &PointQuery) -> (String, Vec<DatabaseValue>) {
    let filter = FilterSql::build(&query.filter);
    let mut sql = String::from(
        "SELECT c.complaint_no, c.category, c.title, c.status::text AS status,
                c.created_date, c.assigned_agency_no, c.is_public, c.image_path,
                sf.addr_text, sf.admin_code, r.region_name,
                ST_X(sf.geom) AS lng,
                ST_Y(sf.geom) AS lat",
    );
    sql.push_str(FROM_CLAUSE);
    sql.push_str(" LEFT JOIN admin_region r ON r.region_code = sf.admin_code");
    sql.push_str(&filter.where_clause());
    sql.push_str(" ORDER BY c.created_date DESC, c.complaint_no DESC");

    let idx = filter.next_idx();
    write!(sql, " LIMIT ${idx} OFFSET ${}", idx + 1).unwrap_or_default();

    let mut params = filter.params().to_vec();
    params.push(DatabaseValue::Int64(i64::from(query.limit)));
    params.push(DatabaseValue::Int64(
        i64::try_from(query.offset).unwrap_or(i64::MAX),
    ));

    (sql, params)
}

/// Renders the count query for `filter`.
#[must_use]
pub fn count_sql(filter: &ComplaintFilter) -> (String, Vec<DatabaseValue>) {
    let filter = FilterSql::build(filter);
    let mut sql = String::from("SELECT COUNT(*) AS cnt");
    sql.push_str(FROM_CLAUSE);
    sql.push_str(&filter.where_clause());
    (sql, filter.params().to_vec())
}

/// Renders the per-region count query for `filter`.
#[must_use]
pub fn region_count_sql(filter: &ComplaintFilter) -> (String, Vec<DatabaseValue>) {
    let filter = FilterSql::build(filter);
    let mut sql = String::from(
        "SELECT sf.admin_code AS region_code, MAX(r.region_name) AS region_name,
                COUNT(*) AS cnt",
    );
    sql.push_str(FROM_CLAUSE);
    sql.push_str(" LEFT JOIN admin_region r ON r.region_code = sf.admin_code");
    sql.push_str(&filter.where_clause());
    sql.push_str(" AND sf.admin_code IS NOT NULL GROUP BY sf.admin_code");
    (sql, filter.params().to_vec())
}

/// [`GeometryStore`] backed by a `PostGIS` database.
pub struct PostgisStore {
    db: Arc<dyn Database>,
}

impl PostgisStore {
    /// Wraps an open database connection.
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GeometryStore for PostgisStore {
    async fn fetch_points(&self, query: &PointQuery) -> Result<Vec<ComplaintGeoRecord>, DbError> {
        let (sql, params) = point_query_sql(query);
        let rows = self.db.query_raw_params(&sql, &params).await?;

        let mut records = Vec::with_capacity(rows.len());

        for row in &rows {
            let id: i64 = required(row.to_value("complaint_no"), "complaint_no", None)?;
            let at = Some(id);

            let status_name: String = required(row.to_value("status"), "status", at)?;
            let status = status_name
                .parse::<ComplaintStatus>()
                .map_err(|_| DbError::Conversion {
                    message: format!("Unknown status '{status_name}' on complaint {id}"),
                })?;

            let created: chrono::NaiveDateTime =
                required(row.to_value("created_date"), "created_date", at)?;

            records.push(ComplaintGeoRecord {
                id,
                category: required(row.to_value("category"), "category", at)?,
                status,
                title: required(row.to_value("title"), "title", at)?,
                address: row.to_value("addr_text").unwrap_or(None),
                longitude: required(row.to_value("lng"), "lng", at)?,
                latitude: required(row.to_value("lat"), "lat", at)?,
                region_code: row.to_value("admin_code").unwrap_or(None),
                region_name: row.to_value("region_name").unwrap_or(None),
                created_at: chrono::DateTime::<chrono::Utc>::from_naive_utc_and_offset(
                    created,
                    chrono::Utc,
                ),
                agency_no: row.to_value("assigned_agency_no").unwrap_or(None),
                is_public: required(row.to_value("is_public"), "is_public", at)?,
                image_path: row.to_value("image_path").unwrap_or(None),
            });
        }

        Ok(records)
    }

    async fn count(&self, filter: &ComplaintFilter) -> Result<u64, DbError> {
        let (sql, params) = count_sql(filter);
        let rows = self.db.query_raw_params(&sql, &params).await?;

        let Some(row) = rows.first() else {
            return Ok(0);
        };

        non_negative(required(row.to_value("cnt"), "cnt", None)?, "cnt")
    }

    async fn count_by_region(
        &self,
        filter: &ComplaintFilter,
    ) -> Result<Vec<RegionCountRow>, DbError> {
        let (sql, params) = region_count_sql(filter);
        let rows = self.db.query_raw_params(&sql, &params).await?;

        rows.iter()
            .map(|row| {
                Ok(RegionCountRow {
                    region_code: required(row.to_value("region_code"), "region_code", None)?,
                    region_name: row.to_value("region_name").unwrap_or(None),
                    count: non_negative(required(row.to_value("cnt"), "cnt", None)?, "cnt")?,
                })
            })
            .collect()
    }
}

/// Unwraps a required column, reporting a missing or mistyped value as
/// [`DbError::Conversion`].
fn required<T, E: std::fmt::Display>(
    value: Result<T, E>,
    column: &str,
    complaint_no: Option<i64>,
) -> Result<T, DbError> {
    value.map_err(|e| DbError::Conversion {
        message: match complaint_no {
            Some(id) => format!("Failed to parse {column} on complaint {id}: {e}"),
            None => format!("Failed to parse {column}: {e}"),
        },
    })
}

fn non_negative(value: i64, column: &str) -> Result<u64, DbError> {
    u64::try_from(value).map_err(|_| DbError::Conversion {
        message: format!("Negative {column}: {value}"),
    })
}
