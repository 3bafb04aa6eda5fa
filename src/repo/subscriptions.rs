use chrono::{DateTime, NaiveDate, Utc};

use sqlx::PgExecutor;

use uuid::Uuid;

use crate::domain::{PaymentMethod, Role, SubscriptionStatus};
use crate::model::{ExpiringCandidate, NewSubscription, Subscription};

use super::parse_rows;

const SUBSCRIPTION_COLUMNS: &str = "s.id, s.user_id, s.membership_id, s.start_date, s.end_date, \
     s.status, s.payment_method, s.notes, s.created_at";

/// Subscription columns as stored, with statuses still in text form
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    membership_id: Uuid,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    status: String,
    payment_method: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = String;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            membership_id: row.membership_id,
            start_date: row.start_date,
            end_date: row.end_date,
            status: row.status.parse()?,
            payment_method: row
                .payment_method
                .as_deref()
                .map(str::parse::<PaymentMethod>)
                .transpose()?,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanSubscriptionRow {
    #[sqlx(flatten)]
    subscription: SubscriptionRow,
    plan_name: String,
}

/// A member's subscription with the name of the plan it was bought against
#[derive(Debug, Clone)]
pub struct SubscriptionWithPlan {
    pub subscription: Subscription,
    pub plan_name: String,
}

impl TryFrom<PlanSubscriptionRow> for SubscriptionWithPlan {
    type Error = String;

    fn try_from(row: PlanSubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            subscription: row.subscription.try_into()?,
            plan_name: row.plan_name,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ExpiringRow {
    #[sqlx(flatten)]
    subscription: SubscriptionRow,
    member_name: String,
    member_email: String,
    plan_name: String,
    price: i64,
}

impl TryFrom<ExpiringRow> for ExpiringCandidate {
    type Error = String;

    fn try_from(row: ExpiringRow) -> Result<Self, Self::Error> {
        Ok(Self {
            subscription: row.subscription.try_into()?,
            member_name: row.member_name,
            member_email: row.member_email,
            plan_name: row.plan_name,
            price: row.price,
        })
    }
}

/// Repository for interfacing with the subscriptions table
pub struct SubscriptionRepo;

impl SubscriptionRepo {
    #[tracing::instrument(name = "Insert subscription", skip(executor))]
    pub async fn insert<'con>(
        executor: impl PgExecutor<'con>,
        new_subscription: &NewSubscription,
    ) -> sqlx::Result<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "insert into subscriptions(user_id, membership_id, start_date, end_date, status, payment_method, notes) \
             values ($1, $2, $3, $4, 'active', $5, $6) returning id",
        )
        .bind(new_subscription.user_id)
        .bind(new_subscription.membership_id)
        .bind(new_subscription.start_date)
        .bind(new_subscription.end_date)
        .bind(new_subscription.payment_method.map(|p| p.as_str()))
        .bind(&new_subscription.notes)
        .fetch_one(executor)
        .await
    }

    #[tracing::instrument(name = "Fetch subscription by id", skip(executor))]
    pub async fn fetch_by_id<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<Option<Subscription>> {
        let sql = format!(
            "select {} from subscriptions s where s.id = $1",
            SUBSCRIPTION_COLUMNS
        );
        let row = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(row.and_then(|row| parse_rows(vec![row]).pop()))
    }

    /// Every subscription of a member with its plan name, newest start first
    #[tracing::instrument(name = "Fetch subscriptions for member", skip(executor))]
    pub async fn fetch_by_user<'con>(
        executor: impl PgExecutor<'con>,
        user_id: Uuid,
    ) -> sqlx::Result<Vec<SubscriptionWithPlan>> {
        let sql = format!(
            "select {}, m.name as plan_name \
             from subscriptions s join memberships m on m.id = s.membership_id \
             where s.user_id = $1 \
             order by s.start_date desc, s.created_at desc",
            SUBSCRIPTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, PlanSubscriptionRow>(&sql)
            .bind(user_id)
            .fetch_all(executor)
            .await?;

        Ok(parse_rows(rows))
    }

    /// Every subscription belonging to any of `user_ids`
    #[tracing::instrument(name = "Fetch subscriptions for members", skip(executor, user_ids))]
    pub async fn fetch_for_users<'con>(
        executor: impl PgExecutor<'con>,
        user_ids: &[Uuid],
    ) -> sqlx::Result<Vec<Subscription>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "select {} from subscriptions s where s.user_id = any($1)",
            SUBSCRIPTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(user_ids)
            .fetch_all(executor)
            .await?;

        Ok(parse_rows(rows))
    }

    /// Every subscription held by a user of `role`
    #[tracing::instrument(name = "Fetch subscriptions for role", skip(executor))]
    pub async fn fetch_for_role<'con>(
        executor: impl PgExecutor<'con>,
        role: Role,
    ) -> sqlx::Result<Vec<Subscription>> {
        let sql = format!(
            "select {} from subscriptions s join users u on u.id = s.user_id where u.role = $1",
            SUBSCRIPTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(role.as_str())
            .fetch_all(executor)
            .await?;

        Ok(parse_rows(rows))
    }

    /// Active subscriptions with an end date in `[from, until]`, soonest first
    #[tracing::instrument(name = "Fetch expiring subscriptions", skip(executor))]
    pub async fn fetch_expiring<'con>(
        executor: impl PgExecutor<'con>,
        from: NaiveDate,
        until: NaiveDate,
    ) -> sqlx::Result<Vec<ExpiringCandidate>> {
        let sql = format!(
            "select {}, u.name as member_name, u.email as member_email, \
                    m.name as plan_name, m.price as price \
             from subscriptions s \
             join users u on u.id = s.user_id \
             join memberships m on m.id = s.membership_id \
             where s.status = 'active' and s.end_date between $1 and $2 \
             order by s.end_date asc, s.id",
            SUBSCRIPTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, ExpiringRow>(&sql)
            .bind(from)
            .bind(until)
            .fetch_all(executor)
            .await?;

        Ok(parse_rows(rows))
    }

    /// Number of a member's active subscriptions overlapping `[start, end]`
    #[tracing::instrument(name = "Count overlapping active subscriptions", skip(executor))]
    pub async fn count_active_overlapping<'con>(
        executor: impl PgExecutor<'con>,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "select count(*) from subscriptions \
             where user_id = $1 and status = 'active' \
               and start_date <= $3 and (end_date is null or end_date >= $2)",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(executor)
        .await
    }

    /// Move a subscription from status `from` to `to`.
    ///
    /// Returns `None` when no subscription with that id is currently in `from`,
    /// so a concurrent change made after `from` was read is never overwritten.
    #[tracing::instrument(name = "Update subscription status", skip(executor))]
    pub async fn update_status<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
        from: SubscriptionStatus,
        to: SubscriptionStatus,
    ) -> sqlx::Result<Option<Subscription>> {
        let sql = format!(
            "update subscriptions s set status = $3 where s.id = $1 and s.status = $2 returning {}",
            SUBSCRIPTION_COLUMNS
        );
        let row = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(executor)
            .await?;

        Ok(row.and_then(|row| parse_rows(vec![row]).pop()))
    }
}
