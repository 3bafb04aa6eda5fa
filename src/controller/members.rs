use std::collections::HashMap;

use actix_web::dev::HttpServiceFactory;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

use chrono::{DateTime, NaiveDate, Utc};

use secrecy::{ExposeSecret, Secret};

use serde::{Deserialize, Serialize};

use sqlx::{PgExecutor, PgPool};

use uuid::Uuid;

use crate::auth::{hash_password, AdminSession};
use crate::controller::Created;
use crate::domain::{Gender, Role};
use crate::error::{RestError, RestResult};
use crate::lifecycle::{
    compute_current_status, days_until_expiry, Clock, ExpiryClass, LifecycleEvaluator,
    MemberStatus,
};
use crate::model::{MemberUpdate, NewUser, Subscription, User};
use crate::pagination::{PageRequest, Paginated};
use crate::repo::{SubscriptionRepo, UserFilter, UsersRepo};

const MIN_PASSWORD_LEN: usize = 8;

/// JSON body for registering a member or coach
#[derive(Debug, Deserialize)]
pub struct NewMemberBody {
    name: String,
    email: String,
    password: Secret<String>,
    phone: Option<String>,
    gender: Option<Gender>,
    birth_date: Option<NaiveDate>,
    role: Option<Role>,
}

impl NewMemberBody {
    fn parse(self) -> Result<(NewUser, Secret<String>), String> {
        let role = match self.role.unwrap_or(Role::Member) {
            Role::Admin => return Err("Administrators cannot be registered as members".into()),
            role => role,
        };
        if self.password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
            return Err(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LEN
            ));
        }
        let phone = self
            .phone
            .map(|phone| phone.trim().to_string())
            .filter(|phone| !phone.is_empty());

        let new_user = NewUser {
            name: self.name.parse()?,
            email: self.email.parse()?,
            // Filled in once the password is hashed
            password_hash: String::new(),
            phone,
            role,
            gender: self.gender,
            birth_date: self.birth_date,
        };
        Ok((new_user, self.password))
    }
}

/// Look up a user by id, hiding anyone who is not a member
async fn fetch_member<'con>(executor: impl PgExecutor<'con>, id: Uuid) -> RestResult<User> {
    UsersRepo::fetch_by_id(executor, id)
        .await?
        .filter(|user| user.role == Role::Member)
        .ok_or_else(|| RestError::NotFound("Member not found".into()))
}

/// Register a new member
#[tracing::instrument(name = "Create a new member", skip(body, pool))]
#[post("")]
async fn create(
    admin: AdminSession,
    body: web::Json<NewMemberBody>,
    pool: web::Data<PgPool>,
) -> RestResult<impl Responder> {
    let (mut new_user, password) = body.into_inner().parse().map_err(RestError::ParseError)?;
    new_user.password_hash = hash_password(password).await?;

    let id = UsersRepo::insert(pool.get_ref(), &new_user)
        .await
        .map_err(|e| RestError::conflict_on_unique(e, "Email or phone is already registered"))?;

    tracing::info!("Admin {} registered {} {}", admin.user_id(), new_user.role, id);
    Ok(HttpResponse::Created().json(Created { id }))
}

#[derive(Debug, Deserialize)]
pub struct MemberListQuery {
    search: Option<String>,
    subscription_status: Option<MemberStatus>,
    page: Option<u32>,
    per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
struct MemberSummary {
    #[serde(flatten)]
    user: User,
    subscription_status: MemberStatus,
    current_subscription: Option<Subscription>,
}

impl MemberSummary {
    fn new<'a, I>(user: User, held: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a Subscription>,
    {
        let current = compute_current_status(held, now);
        Self {
            user,
            subscription_status: current.status,
            current_subscription: current.subscription.cloned(),
        }
    }
}

/// List members with their computed subscription status
#[tracing::instrument(name = "List members", skip(pool, clock))]
#[get("")]
async fn list(
    _admin: AdminSession,
    query: web::Query<MemberListQuery>,
    pool: web::Data<PgPool>,
    clock: web::Data<dyn Clock>,
) -> RestResult<impl Responder> {
    let query = query.into_inner();
    let filter = UserFilter {
        search: query.search,
        status: query.subscription_status,
        ..UserFilter::members()
    };
    let page = PageRequest::new(query.page, query.per_page);
    let now = clock.now();
    let today = now.date_naive();
    let pool = pool.get_ref();

    let total = UsersRepo::count(pool, &filter, today).await?;
    let members = UsersRepo::fetch_page(pool, &filter, today, page).await?;

    let ids: Vec<Uuid> = members.iter().map(|m| m.id).collect();
    let mut by_member: HashMap<Uuid, Vec<Subscription>> = HashMap::new();
    for subscription in SubscriptionRepo::fetch_for_users(pool, &ids).await? {
        by_member
            .entry(subscription.user_id)
            .or_default()
            .push(subscription);
    }

    let data = members
        .into_iter()
        .map(|user| {
            let held = by_member.get(&user.id).map(Vec::as_slice).unwrap_or(&[]);
            MemberSummary::new(user, held, now)
        })
        .collect();

    Ok(HttpResponse::Ok().json(Paginated::new(data, page, total)))
}

#[derive(Debug, Serialize)]
struct MemberStatusBody<'a> {
    member_id: Uuid,
    status: MemberStatus,
    subscription: Option<&'a Subscription>,
}

/// A member's current status
#[tracing::instrument(name = "Fetch member status", skip(pool, clock))]
#[get("/{id}/status")]
async fn show_status(
    _admin: AdminSession,
    path: web::Path<(Uuid,)>,
    pool: web::Data<PgPool>,
    clock: web::Data<dyn Clock>,
) -> RestResult<impl Responder> {
    let (member_id,) = path.into_inner();
    let pool = pool.get_ref();

    fetch_member(pool, member_id).await?;

    let held = SubscriptionRepo::fetch_by_user(pool, member_id).await?;
    let current = compute_current_status(held.iter().map(|s| &s.subscription), clock.now());

    Ok(HttpResponse::Ok().json(MemberStatusBody {
        member_id,
        status: current.status,
        subscription: current.subscription,
    }))
}

#[derive(Debug, Serialize)]
struct MemberSubscriptionView {
    #[serde(flatten)]
    subscription: Subscription,
    plan_name: String,
    days_until_expiry: Option<i64>,
    expiry: ExpiryClass,
}

/// Every subscription of a member, newest first
#[tracing::instrument(name = "Fetch member subscriptions", skip(pool, clock, evaluator))]
#[get("/{id}/subscriptions")]
async fn list_subscriptions(
    _admin: AdminSession,
    path: web::Path<(Uuid,)>,
    pool: web::Data<PgPool>,
    clock: web::Data<dyn Clock>,
    evaluator: web::Data<LifecycleEvaluator>,
) -> RestResult<impl Responder> {
    let (member_id,) = path.into_inner();
    let pool = pool.get_ref();
    let now = clock.now();

    fetch_member(pool, member_id).await?;

    let views: Vec<MemberSubscriptionView> = SubscriptionRepo::fetch_by_user(pool, member_id)
        .await?
        .into_iter()
        .map(|s| MemberSubscriptionView {
            days_until_expiry: days_until_expiry(s.subscription.end_date, now),
            expiry: evaluator.classify(&s.subscription, now),
            subscription: s.subscription,
            plan_name: s.plan_name,
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// A member's profile with their computed subscription status
#[tracing::instrument(name = "Fetch member", skip(pool, clock))]
#[get("/{id}")]
async fn show(
    _admin: AdminSession,
    path: web::Path<(Uuid,)>,
    pool: web::Data<PgPool>,
    clock: web::Data<dyn Clock>,
) -> RestResult<impl Responder> {
    let (member_id,) = path.into_inner();
    let pool = pool.get_ref();

    let member = fetch_member(pool, member_id).await?;
    let held = SubscriptionRepo::fetch_by_user(pool, member_id).await?;

    Ok(HttpResponse::Ok().json(MemberSummary::new(
        member,
        held.iter().map(|s| &s.subscription),
        clock.now(),
    )))
}

/// JSON body for editing a member; omitted fields keep their current value
#[derive(Debug, Deserialize)]
pub struct UpdateMemberBody {
    name: Option<String>,
    email: Option<String>,
    /// An empty phone number clears it
    phone: Option<String>,
    gender: Option<Gender>,
    birth_date: Option<NaiveDate>,
}

impl UpdateMemberBody {
    fn apply_to(self, member: &User) -> Result<MemberUpdate, String> {
        let phone = match self.phone {
            Some(phone) => Some(phone.trim().to_string()).filter(|phone| !phone.is_empty()),
            None => member.phone.clone(),
        };

        Ok(MemberUpdate {
            name: self.name.as_deref().unwrap_or(&member.name).parse()?,
            email: self.email.as_deref().unwrap_or(&member.email).parse()?,
            phone,
            gender: self.gender.or(member.gender),
            birth_date: self.birth_date.or(member.birth_date),
        })
    }
}

/// Edit a member's profile
#[tracing::instrument(name = "Update member", skip(body, pool))]
#[put("/{id}")]
async fn update(
    admin: AdminSession,
    path: web::Path<(Uuid,)>,
    body: web::Json<UpdateMemberBody>,
    pool: web::Data<PgPool>,
) -> RestResult<impl Responder> {
    let (member_id,) = path.into_inner();

    let mut tx = pool.begin().await?;

    let member = fetch_member(&mut *tx, member_id).await?;
    let changes = body
        .into_inner()
        .apply_to(&member)
        .map_err(RestError::ParseError)?;
    let updated = UsersRepo::update_member(&mut *tx, member_id, &changes)
        .await
        .map_err(|e| RestError::conflict_on_unique(e, "Email or phone is already registered"))?
        .ok_or_else(|| RestError::NotFound("Member not found".into()))?;
    tx.commit().await?;

    tracing::info!("Admin {} updated member {}", admin.user_id(), member_id);
    Ok(HttpResponse::Ok().json(updated))
}

/// Remove a member together with their subscription history
#[tracing::instrument(name = "Delete member", skip(pool))]
#[delete("/{id}")]
async fn remove(
    admin: AdminSession,
    path: web::Path<(Uuid,)>,
    pool: web::Data<PgPool>,
) -> RestResult<impl Responder> {
    let (member_id,) = path.into_inner();

    if !UsersRepo::delete_member(pool.get_ref(), member_id).await? {
        return Err(RestError::NotFound("Member not found".into()));
    }

    tracing::info!("Admin {} deleted member {}", admin.user_id(), member_id);
    Ok(HttpResponse::NoContent().finish())
}

/// Members API endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/members")
        .service(create)
        .service(list)
        .service(show)
        .service(update)
        .service(remove)
        .service(show_status)
        .service(list_subscriptions)
}
