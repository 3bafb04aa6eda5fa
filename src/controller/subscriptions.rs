use actix_web::dev::HttpServiceFactory;
use actix_web::{patch, post, web, HttpResponse, Responder};

use chrono::NaiveDate;

use serde::{Deserialize, Serialize};

use sqlx::PgPool;

use uuid::Uuid;

use crate::auth::AdminSession;
use crate::domain::{PaymentMethod, SubscriptionStatus};
use crate::error::{RestError, RestResult};
use crate::lifecycle::Clock;
use crate::model::NewSubscription;
use crate::repo::{MembershipsRepo, SubscriptionRepo, UsersRepo};

/// JSON body for subscribing a member to a plan
#[derive(Debug, Deserialize)]
pub struct NewSubscriptionBody {
    user_id: Uuid,
    membership_id: Uuid,
    /// Defaults to today
    start_date: Option<NaiveDate>,
    payment_method: Option<PaymentMethod>,
    notes: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreatedSubscription {
    id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

/// Subscribe a member to a membership plan
#[tracing::instrument(name = "Create a new subscription", skip(pool, clock))]
#[post("")]
async fn create(
    _admin: AdminSession,
    body: web::Json<NewSubscriptionBody>,
    pool: web::Data<PgPool>,
    clock: web::Data<dyn Clock>,
) -> RestResult<impl Responder> {
    let body = body.into_inner();
    let notes = body
        .notes
        .map(|notes| notes.trim().to_string())
        .filter(|notes| !notes.is_empty());

    let mut tx = pool.begin().await?;

    UsersRepo::fetch_by_id(&mut *tx, body.user_id)
        .await?
        .ok_or_else(|| RestError::NotFound("Member not found".into()))?;
    let plan = MembershipsRepo::fetch_by_id(&mut *tx, body.membership_id)
        .await?
        .ok_or_else(|| RestError::NotFound("Membership plan not found".into()))?;
    if !plan.is_active {
        return Err(RestError::ParseError(format!(
            "Membership plan {} is no longer offered",
            plan.name
        )));
    }

    let start_date = body.start_date.unwrap_or_else(|| clock.today());
    let new_subscription =
        NewSubscription::for_plan(body.user_id, &plan, start_date, body.payment_method, notes)
            .map_err(RestError::ParseError)?;

    let overlapping = SubscriptionRepo::count_active_overlapping(
        &mut *tx,
        new_subscription.user_id,
        new_subscription.start_date,
        new_subscription.end_date,
    )
    .await?;
    if overlapping > 0 {
        tracing::warn!(
            "Member {} already has {} active subscription(s) overlapping {} to {}",
            new_subscription.user_id,
            overlapping,
            new_subscription.start_date,
            new_subscription.end_date
        );
    }

    let id = SubscriptionRepo::insert(&mut *tx, &new_subscription).await?;
    tx.commit().await?;

    Ok(HttpResponse::Created().json(CreatedSubscription {
        id,
        start_date: new_subscription.start_date,
        end_date: new_subscription.end_date,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    status: SubscriptionStatus,
}

/// Move a subscription to a new status
#[tracing::instrument(name = "Update subscription status", skip(pool))]
#[patch("/{id}")]
async fn update_status(
    admin: AdminSession,
    path: web::Path<(Uuid,)>,
    body: web::Json<StatusBody>,
    pool: web::Data<PgPool>,
) -> RestResult<impl Responder> {
    let (id,) = path.into_inner();
    let next = body.status;

    let mut tx = pool.begin().await?;

    let current = SubscriptionRepo::fetch_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| RestError::NotFound("Subscription not found".into()))?;
    check_transition(current.status, next)?;

    let updated = SubscriptionRepo::update_status(&mut *tx, id, current.status, next)
        .await?
        .ok_or_else(|| {
            RestError::Conflict(format!(
                "Subscription is no longer {}, reload it and try again",
                current.status
            ))
        })?;
    tx.commit().await?;

    tracing::info!(
        "Admin {} moved subscription {} from {} to {}",
        admin.user_id(),
        id,
        current.status,
        next
    );
    Ok(HttpResponse::Ok().json(updated))
}

fn check_transition(current: SubscriptionStatus, next: SubscriptionStatus) -> RestResult<()> {
    if current == next {
        return Err(RestError::Conflict(format!(
            "Subscription is already {}",
            current
        )));
    }
    if !current.can_transition_to(next) {
        return Err(RestError::Conflict(format!(
            "Cannot change a {} subscription to {}",
            current, next
        )));
    }
    Ok(())
}

/// Subscriptions API endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/subscriptions")
        .service(create)
        .service(update_status)
}
