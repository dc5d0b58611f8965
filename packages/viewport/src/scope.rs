//! Agency scoping and record visibility for a caller.

use civic_map_complaint_models::CallerRole;
use civic_map_database_models::Visibility;
use civic_map_viewport_models::Caller;

/// The agency constraint and visibility actually applied to a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveScope {
    /// Agency the results are restricted to.
    pub agency_no: Option<i64>,
    /// Which records may be returned.
    pub visibility: Visibility,
}

/// Resolves the scope for `caller` given the agency filter they supplied.
///
/// Agency-role callers with no explicit filter are restricted to their own
/// agency. An explicit filter is always honored, so agency staff can still
/// look at other agencies' public complaints. Non-public complaints are
/// only visible to admins and to agency staff looking at their own agency.
#[must_use]
pub fn resolve_scope(caller: &Caller, requested_agency_no: Option<i64>) -> EffectiveScope {
    match caller.role {
        CallerRole::Anonymous | CallerRole::Citizen => EffectiveScope {
            agency_no: requested_agency_no,
            visibility: Visibility::PublicOnly,
        },
        CallerRole::Admin => EffectiveScope {
            agency_no: requested_agency_no,
            visibility: Visibility::All,
        },
        CallerRole::Agency => {
            let Some(own) = caller.agency_no else {
                log::warn!("Agency-role caller without an agency number; applying public scope");
                return EffectiveScope {
                    agency_no: requested_agency_no,
                    visibility: Visibility::PublicOnly,
                };
            };

            let agency_no = requested_agency_no.unwrap_or(own);
            let visibility = if agency_no == own {
                Visibility::All
            } else {
                Visibility::PublicOnly
            };

            EffectiveScope {
                agency_no: Some(agency_no),
                visibility,
            }
        }
    }
}
