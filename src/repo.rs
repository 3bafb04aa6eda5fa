mod memberships;
mod subscriptions;
mod users;

pub use memberships::MembershipsRepo;
pub use subscriptions::{SubscriptionRepo, SubscriptionWithPlan};
pub use users::{StoredCredentials, UserFilter, UsersRepo};

/// Convert raw rows into domain records.
/// Rows holding values the domain does not recognize are logged and skipped.
fn parse_rows<R, T>(rows: Vec<R>) -> Vec<T>
where
    T: TryFrom<R, Error = String>,
{
    rows.into_iter()
        .filter_map(|row| match T::try_from(row) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping unreadable row: {}", e);
                None
            }
        })
        .collect()
}

/// Escape `LIKE` wildcards and wrap the term for a substring match
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
