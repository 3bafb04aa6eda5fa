use uuid::Uuid;

use sqlx::PgExecutor;

use crate::model::{Membership, NewMembership};

const MEMBERSHIP_COLUMNS: &str = "id, name, description, price, duration_days, has_coach, \
     has_workout_plan, has_nutrition_plan, is_active, created_at";

/// Repository for membership plans
pub struct MembershipsRepo;

impl MembershipsRepo {
    #[tracing::instrument(name = "Insert membership plan", skip(executor))]
    pub async fn insert<'con>(
        executor: impl PgExecutor<'con>,
        new_membership: &NewMembership,
    ) -> sqlx::Result<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "insert into memberships(name, description, price, duration_days, has_coach, has_workout_plan, has_nutrition_plan) \
             values ($1, $2, $3, $4, $5, $6, $7) returning id",
        )
        .bind(&new_membership.name)
        .bind(&new_membership.description)
        .bind(new_membership.price)
        .bind(new_membership.duration_days)
        .bind(new_membership.has_coach)
        .bind(new_membership.has_workout_plan)
        .bind(new_membership.has_nutrition_plan)
        .fetch_one(executor)
        .await
    }

    #[tracing::instrument(name = "Fetch membership plan by id", skip(executor))]
    pub async fn fetch_by_id<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<Option<Membership>> {
        let sql = format!("select {} from memberships where id = $1", MEMBERSHIP_COLUMNS);
        sqlx::query_as::<_, Membership>(&sql).bind(id).fetch_optional(executor).await
    }

    /// All plans, cheapest first
    #[tracing::instrument(name = "Fetch membership plans", skip(executor))]
    pub async fn fetch_all<'con>(
        executor: impl PgExecutor<'con>,
        active_only: bool,
    ) -> sqlx::Result<Vec<Membership>> {
        let sql = format!(
            "select {} from memberships where ($1 = false or is_active) order by price, name",
            MEMBERSHIP_COLUMNS
        );
        sqlx::query_as::<_, Membership>(&sql).bind(active_only).fetch_all(executor).await
    }
}
