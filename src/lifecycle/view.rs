use chrono::{DateTime, NaiveDate, Utc};

use serde::Serialize;

use uuid::Uuid;

use crate::domain::PaymentMethod;
use crate::model::ExpiringCandidate;

use super::{days_until_expiry, ExpiryClass, LifecycleEvaluator};

/// One row of the expiring subscriptions dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiringSubscriptionView {
    pub id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub plan_type: String,
    pub end_date: NaiveDate,
    pub days_until_expiry: i64,
    /// Either `expires_today` or `expires_soon`
    pub status: ExpiryClass,
    /// End date as shown on the dashboard, e.g. `Mar 13, 2024`
    pub formatted_end_date: String,
    /// Remaining time as shown on the dashboard, e.g. `In 3 days`
    pub formatted_days: String,
    pub price: i64,
    pub payment_method: Option<PaymentMethod>,
}

/// Expiring subscriptions grouped for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpiringSubscriptions {
    pub total: usize,
    pub expires_today: usize,
    pub expires_soon: usize,
    pub subscriptions: Vec<ExpiringSubscriptionView>,
}

/// Human readable remaining time for a non-negative day count
pub fn format_days(days: i64) -> String {
    match days {
        0 => "Today".into(),
        1 => "Tomorrow".into(),
        n => format!("In {} days", n),
    }
}

pub fn format_end_date(end_date: NaiveDate) -> String {
    end_date.format("%b %d, %Y").to_string()
}

impl LifecycleEvaluator {
    /// Build the dashboard listing from candidate subscriptions.
    ///
    /// Candidates that are not expiring today or soon are dropped. The result is
    /// ordered by end date, soonest first.
    pub fn expiring_views(
        &self,
        candidates: &[ExpiringCandidate],
        now: DateTime<Utc>,
    ) -> ExpiringSubscriptions {
        let mut subscriptions: Vec<ExpiringSubscriptionView> = candidates
            .iter()
            .filter_map(|candidate| self.view(candidate, now))
            .collect();
        subscriptions.sort_by_key(|view| (view.end_date, view.id));

        let expires_today = subscriptions
            .iter()
            .filter(|view| view.status == ExpiryClass::ExpiresToday)
            .count();

        ExpiringSubscriptions {
            total: subscriptions.len(),
            expires_today,
            expires_soon: subscriptions.len() - expires_today,
            subscriptions,
        }
    }

    fn view(
        &self,
        candidate: &ExpiringCandidate,
        now: DateTime<Utc>,
    ) -> Option<ExpiringSubscriptionView> {
        let subscription = &candidate.subscription;

        let status = self.classify(subscription, now);
        if status == ExpiryClass::NotExpiring {
            return None;
        }
        let end_date = subscription.end_date?;
        let days = days_until_expiry(Some(end_date), now)?;

        Some(ExpiringSubscriptionView {
            id: subscription.id,
            user_name: candidate.member_name.clone(),
            user_email: candidate.member_email.clone(),
            plan_type: candidate.plan_name.clone(),
            end_date,
            days_until_expiry: days,
            status,
            formatted_end_date: format_end_date(end_date),
            formatted_days: format_days(days),
            price: candidate.price,
            payment_method: subscription.payment_method,
        })
    }
}
