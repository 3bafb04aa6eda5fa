use actix_web::dev::HttpServiceFactory;
use actix_web::{get, web, HttpResponse, Responder};

use sqlx::PgPool;

use crate::auth::AdminSession;
use crate::domain::Role;
use crate::error::RestResult;
use crate::lifecycle::{Clock, DashboardStats, Headcount, LifecycleEvaluator};
use crate::repo::{MembershipsRepo, SubscriptionRepo, UserFilter, UsersRepo};

/// Active subscriptions ending today or within the configured window
#[tracing::instrument(name = "List expiring subscriptions", skip(pool, clock, evaluator))]
#[get("/expiring-subscriptions")]
async fn expiring_subscriptions(
    _admin: AdminSession,
    pool: web::Data<PgPool>,
    clock: web::Data<dyn Clock>,
    evaluator: web::Data<LifecycleEvaluator>,
) -> RestResult<impl Responder> {
    let now = clock.now();
    let today = now.date_naive();

    let candidates =
        SubscriptionRepo::fetch_expiring(pool.get_ref(), today, evaluator.window_end(today))
            .await?;
    let listing = evaluator.expiring_views(&candidates, now);

    tracing::info!(
        "{} subscriptions expiring ({} today, {} soon)",
        listing.total,
        listing.expires_today,
        listing.expires_soon
    );
    Ok(HttpResponse::Ok().json(listing))
}

/// Member and coach counts with the spread of current subscriptions over plans
#[tracing::instrument(name = "Compute dashboard stats", skip(pool, clock))]
#[get("/stats")]
async fn show_stats(
    _admin: AdminSession,
    pool: web::Data<PgPool>,
    clock: web::Data<dyn Clock>,
) -> RestResult<impl Responder> {
    let now = clock.now();
    let today = now.date_naive();
    let pool = pool.get_ref();

    let headcount = Headcount {
        members: UsersRepo::count(pool, &UserFilter::members(), today).await?,
        coaches: UsersRepo::count(pool, &UserFilter::coaches(), today).await?,
    };
    let plans = MembershipsRepo::fetch_all(pool, false).await?;
    let held = SubscriptionRepo::fetch_for_role(pool, Role::Member).await?;

    Ok(HttpResponse::Ok().json(DashboardStats::compute(headcount, &plans, &held, now)))
}

/// Dashboard API endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/dashboard")
        .service(expiring_subscriptions)
        .service(show_stats)
}
