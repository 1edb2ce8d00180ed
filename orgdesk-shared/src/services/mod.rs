/// Tenancy services
///
/// Each public function is one operation: it takes the store and the
/// caller's resolved [`RequestContext`](crate::auth::RequestContext), checks
/// the gate, validates input, performs its write scoped to the caller's
/// organization, then records an audit entry. Nothing is written when the
/// gate or validation fails.
///
/// # Modules
///
/// - [`organizations`]: onboarding and member listing
/// - [`invites`]: issuing, listing and redeeming invites
/// - [`projects`]: project CRUD and listings
/// - [`tasks`]: task create/toggle/delete
/// - [`audit`]: best-effort audit recording and the activity feed

pub mod audit;
pub mod invites;
pub mod organizations;
pub mod projects;
pub mod tasks;

use crate::error::{TenancyError, TenancyResult};

/// Trims `raw` and checks it is non-empty and at most `max_chars` long
pub(crate) fn required_text(field: &'static str, raw: &str, max_chars: usize) -> TenancyResult<String> {
    let value = raw.trim();

    if value.is_empty() {
        return Err(TenancyError::invalid(field, "must not be empty"));
    }
    if value.chars().count() > max_chars {
        return Err(TenancyError::invalid(
            field,
            format!("must be at most {} characters", max_chars),
        ));
    }

    Ok(value.to_string())
}
