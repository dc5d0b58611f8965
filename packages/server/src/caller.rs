//! Caller identity from gateway-supplied headers.
//!
//! Authentication happens upstream. The gateway forwards the decided role
//! and agency in `X-Caller-Role` and `X-Caller-Agency-No`. Requests without
//! those headers are anonymous.

use actix_web::HttpRequest;
use civic_map_complaint_models::CallerRole;
use civic_map_viewport_models::Caller;

/// Header carrying the caller's role.
pub const ROLE_HEADER: &str = "X-Caller-Role";
/// Header carrying the caller's agency number.
pub const AGENCY_HEADER: &str = "X-Caller-Agency-No";

/// Reads the caller from request headers.
///
/// An unrecognized role is treated as anonymous.
pub fn caller_from_request(req: &HttpRequest) -> Caller {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let role = match header(ROLE_HEADER) {
        Some(value) => value.parse().unwrap_or_else(|_| {
            log::warn!("Unrecognized caller role {value:?}; treating as anonymous");
            CallerRole::Anonymous
        }),
        None => CallerRole::Anonymous,
    };

    let agency_no = header(AGENCY_HEADER).and_then(|value| value.parse().ok());

    Caller { role, agency_no }
}
