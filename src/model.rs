mod membership;
mod subscription;
mod user;

pub use membership::{Membership, NewMembership};
pub use subscription::{ExpiringCandidate, NewSubscription, Subscription};
pub use user::{MemberUpdate, NewUser, User};
