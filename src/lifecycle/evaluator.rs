use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, Utc};

use serde::{Deserialize, Serialize};

use crate::model::Subscription;

/// Default number of days ahead a subscription counts as "expiring soon"
pub const DEFAULT_EXPIRY_WINDOW_DAYS: u32 = 7;

/// Where a subscription stands relative to its end date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryClass {
    /// Last day of the subscription is today
    ExpiresToday,
    /// Ends within the look-ahead window, but not today
    ExpiresSoon,
    /// Already over, ends later than the window, has no end date, or is not active
    NotExpiring,
}

/// Whether a member currently holds a running subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Inactive,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl FromStr for MemberStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("{} is not a valid member status", other)),
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member's status together with the subscription that grants it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentStatus<'a> {
    pub status: MemberStatus,
    pub subscription: Option<&'a Subscription>,
}

/// Whole days from `now`'s calendar date until `end_date`.
///
/// Zero means the subscription lapses today and negative values mean it is
/// already over. A missing end date never expires and yields `None`.
pub fn days_until_expiry(end_date: Option<NaiveDate>, now: DateTime<Utc>) -> Option<i64> {
    end_date.map(|end| (end - now.date_naive()).num_days())
}

/// Compute a member's status from all of their subscriptions.
///
/// A member is active when one of their subscriptions is `active` and today
/// falls within its start and end dates, both inclusive. When several
/// subscriptions qualify, the most recently started one is reported.
pub fn compute_current_status<'a, I>(subscriptions: I, now: DateTime<Utc>) -> CurrentStatus<'a>
where
    I: IntoIterator<Item = &'a Subscription>,
{
    let today = now.date_naive();

    let current = subscriptions
        .into_iter()
        .filter(|s| s.is_active())
        .filter(|s| s.start_date <= today && s.end_date.map_or(true, |end| today <= end))
        .max_by_key(|s| (s.start_date, s.created_at));

    match current {
        Some(subscription) => CurrentStatus {
            status: MemberStatus::Active,
            subscription: Some(subscription),
        },
        None => CurrentStatus {
            status: MemberStatus::Inactive,
            subscription: None,
        },
    }
}

/// Classifies subscriptions against a configurable look-ahead window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleEvaluator {
    window_days: u32,
}

impl Default for LifecycleEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_EXPIRY_WINDOW_DAYS)
    }
}

impl LifecycleEvaluator {
    pub fn new(window_days: u32) -> Self {
        Self { window_days }
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    /// Last end date that still counts as expiring soon when today is `today`
    pub fn window_end(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_add_days(Days::new(self.window_days.into()))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Classify a day count as produced by [`days_until_expiry`]
    pub fn classify_days(&self, days: i64) -> ExpiryClass {
        match days {
            0 => ExpiryClass::ExpiresToday,
            d if d >= 1 && d <= i64::from(self.window_days) => ExpiryClass::ExpiresSoon,
            _ => ExpiryClass::NotExpiring,
        }
    }

    /// Classify one subscription. Only `active` subscriptions can be expiring.
    pub fn classify(&self, subscription: &Subscription, now: DateTime<Utc>) -> ExpiryClass {
        if !subscription.is_active() {
            return ExpiryClass::NotExpiring;
        }
        match days_until_expiry(subscription.end_date, now) {
            Some(days) => self.classify_days(days),
            None => ExpiryClass::NotExpiring,
        }
    }
}
