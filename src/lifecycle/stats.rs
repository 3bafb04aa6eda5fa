use std::collections::HashMap;

use chrono::{DateTime, Utc};

use serde::Serialize;

use uuid::Uuid;

use crate::model::{Membership, Subscription};

use super::compute_current_status;

/// Number of members currently subscribed through one plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanShare {
    pub membership_id: Uuid,
    pub name: String,
    pub value: i64,
}

/// Headline numbers for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_members: i64,
    pub active_members: i64,
    pub inactive_members: i64,
    pub total_coaches: i64,
    /// Every plan, including those nobody currently holds
    pub membership_distribution: Vec<PlanShare>,
}

/// Registered user counts, as read from storage
#[derive(Debug, Clone, Copy)]
pub struct Headcount {
    pub members: i64,
    pub coaches: i64,
}

impl DashboardStats {
    /// Tally current subscriptions per member.
    ///
    /// `subscriptions` are all subscriptions held by members. Each member is
    /// counted once, under the plan of the subscription reported by
    /// [`compute_current_status`].
    pub fn compute(
        headcount: Headcount,
        plans: &[Membership],
        subscriptions: &[Subscription],
        now: DateTime<Utc>,
    ) -> Self {
        let mut by_member: HashMap<Uuid, Vec<&Subscription>> = HashMap::new();
        for subscription in subscriptions {
            by_member
                .entry(subscription.user_id)
                .or_default()
                .push(subscription);
        }

        let mut active_members = 0;
        let mut by_plan: HashMap<Uuid, i64> = HashMap::new();
        for held in by_member.values() {
            if let Some(current) = compute_current_status(held.iter().copied(), now).subscription {
                active_members += 1;
                *by_plan.entry(current.membership_id).or_default() += 1;
            }
        }

        let membership_distribution = plans
            .iter()
            .map(|plan| PlanShare {
                membership_id: plan.id,
                name: plan.name.clone(),
                value: by_plan.get(&plan.id).copied().unwrap_or(0),
            })
            .collect();

        Self {
            total_members: headcount.members,
            active_members,
            inactive_members: (headcount.members - active_members).max(0),
            total_coaches: headcount.coaches,
            membership_distribution,
        }
    }
}
