pub mod coaches;
pub mod dashboard;
pub mod login;
pub mod members;
pub mod memberships;
pub mod subscriptions;

use serde::Serialize;

use uuid::Uuid;

/// Body returned when a record is created
#[derive(Debug, Serialize)]
struct Created {
    id: Uuid,
}
