mod clock;
mod evaluator;
mod stats;
mod view;

pub use clock::{Clock, FixedClock, SystemClock};
pub use evaluator::{
    compute_current_status, days_until_expiry, CurrentStatus, ExpiryClass, LifecycleEvaluator,
    MemberStatus, DEFAULT_EXPIRY_WINDOW_DAYS,
};
pub use stats::{DashboardStats, Headcount, PlanShare};
pub use view::{format_days, format_end_date, ExpiringSubscriptionView, ExpiringSubscriptions};
