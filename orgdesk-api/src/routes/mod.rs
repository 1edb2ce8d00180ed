/// API route handlers
///
/// Handlers are thin: extract, call one service with the request's
/// resolved `RequestContext`, shape the response.
///
/// - `health`: Health check endpoint
/// - `organizations`: onboarding, current organization, members
/// - `projects`: project create/list/detail
/// - `tasks`: task create/toggle/delete
/// - `invites`: invite create/list/accept
/// - `activity`: recent audit entries

pub mod activity;
pub mod health;
pub mod invites;
pub mod organizations;
pub mod projects;
pub mod tasks;
