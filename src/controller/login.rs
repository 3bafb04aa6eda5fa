use actix_web::dev::HttpServiceFactory;
use actix_web::{post, web, HttpResponse, Responder};

use chrono::{DateTime, Utc};

use serde::Serialize;

use sqlx::PgPool;

use uuid::Uuid;

use crate::auth::{validate_credentials, Credentials, SessionClaims, SessionTtl};
use crate::crypto::SigningKey;
use crate::domain::Role;
use crate::error::{RestError, RestResult};
use crate::lifecycle::Clock;

#[derive(Debug, Serialize)]
struct SessionUser {
    id: Uuid,
    name: String,
    email: String,
    role: Role,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    token_type: &'static str,
    expires_at: DateTime<Utc>,
    user: SessionUser,
}

/// Exchange administrator credentials for a bearer session token
#[tracing::instrument(
    name = "Log in",
    skip(credentials, pool, signing_key, clock, ttl),
    fields(email = %credentials.email)
)]
#[post("")]
async fn login(
    credentials: web::Json<Credentials>,
    pool: web::Data<PgPool>,
    signing_key: web::Data<SigningKey>,
    clock: web::Data<dyn Clock>,
    ttl: web::Data<SessionTtl>,
) -> RestResult<impl Responder> {
    let user = validate_credentials(pool.get_ref(), credentials.into_inner()).await?;

    if user.role != Role::Admin {
        tracing::info!("Refused dashboard session for {} user {}", user.role, user.id);
        return Err(RestError::Forbidden(
            "Only administrators can access the dashboard".into(),
        ));
    }

    let claims = SessionClaims {
        user_id: user.id,
        role: user.role,
    };
    let (token, expires_at) = claims.issue(signing_key.get_ref(), clock.now(), ttl.0)?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        token: token.as_ref().to_string(),
        token_type: "Bearer",
        expires_at,
        user: SessionUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        },
    }))
}

/// Session API endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/login").service(login)
}
