use actix_web::dev::HttpServiceFactory;
use actix_web::{get, web, HttpResponse, Responder};

use serde::Deserialize;

use sqlx::PgPool;

use crate::auth::AdminSession;
use crate::error::RestResult;
use crate::lifecycle::Clock;
use crate::pagination::{PageRequest, Paginated};
use crate::repo::{UserFilter, UsersRepo};

#[derive(Debug, Deserialize)]
pub struct CoachListQuery {
    search: Option<String>,
    page: Option<u32>,
    per_page: Option<u32>,
}

/// List coaches, newest first
#[tracing::instrument(name = "List coaches", skip(pool, clock))]
#[get("")]
async fn list(
    _admin: AdminSession,
    query: web::Query<CoachListQuery>,
    pool: web::Data<PgPool>,
    clock: web::Data<dyn Clock>,
) -> RestResult<impl Responder> {
    let query = query.into_inner();
    let filter = UserFilter {
        search: query.search,
        ..UserFilter::coaches()
    };
    let page = PageRequest::new(query.page, query.per_page);
    let today = clock.today();
    let pool = pool.get_ref();

    let total = UsersRepo::count(pool, &filter, today).await?;
    let coaches = UsersRepo::fetch_page(pool, &filter, today, page).await?;

    Ok(HttpResponse::Ok().json(Paginated::new(coaches, page, total)))
}

/// Coaches API endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/coaches").service(list)
}
