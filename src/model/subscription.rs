use chrono::{DateTime, Days, NaiveDate, Utc};

use serde::Serialize;

use uuid::Uuid;

use crate::domain::{PaymentMethod, SubscriptionStatus};
use crate::model::Membership;

/// New subscription request, with the end date derived from the plan
#[derive(Debug)]
pub struct NewSubscription {
    pub user_id: Uuid,
    pub membership_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

impl NewSubscription {
    /// Subscribe a member to `plan` starting at `start_date`.
    /// The subscription ends `duration_days` after it starts.
    pub fn for_plan(
        user_id: Uuid,
        plan: &Membership,
        start_date: NaiveDate,
        payment_method: Option<PaymentMethod>,
        notes: Option<String>,
    ) -> Result<Self, String> {
        let duration = u64::try_from(plan.duration_days)
            .map_err(|_| format!("Plan {} has a negative duration", plan.name))?;
        let end_date = start_date
            .checked_add_days(Days::new(duration))
            .ok_or_else(|| format!("Plan {} ends out of the supported date range", plan.name))?;

        Ok(Self {
            user_id,
            membership_id: plan.id,
            start_date,
            end_date,
            payment_method,
            notes,
        })
    }
}

/// Stored subscription record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub membership_id: Uuid,
    pub start_date: NaiveDate,
    /// `None` when the stored record has no end date; such subscriptions never expire
    pub end_date: Option<NaiveDate>,
    pub status: SubscriptionStatus,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether the stored status is `active`; dates are not considered
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Active subscription joined with its member and plan, as fetched for the expiry dashboard
#[derive(Debug, Clone)]
pub struct ExpiringCandidate {
    pub subscription: Subscription,
    pub member_name: String,
    pub member_email: String,
    pub plan_name: String,
    pub price: i64,
}
