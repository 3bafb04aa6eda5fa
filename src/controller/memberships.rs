use actix_web::dev::HttpServiceFactory;
use actix_web::{get, post, web, HttpResponse, Responder};

use serde::Deserialize;

use sqlx::PgPool;

use crate::auth::AdminSession;
use crate::controller::Created;
use crate::error::{RestError, RestResult};
use crate::model::NewMembership;
use crate::repo::MembershipsRepo;

/// JSON body for a new membership plan
#[derive(Debug, Deserialize)]
pub struct NewMembershipBody {
    name: String,
    description: Option<String>,
    price: i64,
    duration_days: i32,
    #[serde(default)]
    has_coach: bool,
    #[serde(default)]
    has_workout_plan: bool,
    #[serde(default)]
    has_nutrition_plan: bool,
}

impl TryFrom<NewMembershipBody> for NewMembership {
    type Error = String;

    fn try_from(body: NewMembershipBody) -> Result<Self, Self::Error> {
        let name = body.name.trim();
        if name.is_empty() {
            return Err("Plan name cannot be empty".into());
        }
        if body.duration_days < 1 {
            return Err("Plan duration must be at least one day".into());
        }
        if body.price < 0 {
            return Err("Plan price cannot be negative".into());
        }

        Ok(Self {
            name: name.to_string(),
            description: body.description.filter(|d| !d.trim().is_empty()),
            price: body.price,
            duration_days: body.duration_days,
            has_coach: body.has_coach,
            has_workout_plan: body.has_workout_plan,
            has_nutrition_plan: body.has_nutrition_plan,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct MembershipListQuery {
    active_only: Option<bool>,
}

/// List membership plans, cheapest first
#[tracing::instrument(name = "List membership plans", skip(pool))]
#[get("")]
async fn list(
    _admin: AdminSession,
    query: web::Query<MembershipListQuery>,
    pool: web::Data<PgPool>,
) -> RestResult<impl Responder> {
    let active_only = query.active_only.unwrap_or(false);
    let plans = MembershipsRepo::fetch_all(pool.get_ref(), active_only).await?;

    Ok(HttpResponse::Ok().json(plans))
}

/// Create a new membership plan
#[tracing::instrument(name = "Create a membership plan", skip(pool))]
#[post("")]
async fn create(
    _admin: AdminSession,
    body: web::Json<NewMembershipBody>,
    pool: web::Data<PgPool>,
) -> RestResult<impl Responder> {
    let new_membership: NewMembership = body
        .into_inner()
        .try_into()
        .map_err(RestError::ParseError)?;
    let id = MembershipsRepo::insert(pool.get_ref(), &new_membership).await?;

    Ok(HttpResponse::Created().json(Created { id }))
}

/// Membership plan API endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/memberships").service(list).service(create)
}
