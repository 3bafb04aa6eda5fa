use std::future::Future;
use std::pin::Pin;

use actix_web::{dev, web, FromRequest, HttpRequest};

use anyhow::Context;

use chrono::{DateTime, Duration, Utc};

use serde::{Deserialize, Serialize};

use uuid::Uuid;

use crate::auth::bearer_token;
use crate::crypto::{SigningKey, Token};
use crate::domain::Role;
use crate::error::RestError;
use crate::lifecycle::Clock;

/// How long issued session tokens stay valid
#[derive(Debug, Clone, Copy)]
pub struct SessionTtl(pub Duration);

/// Payload carried by a session token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub role: Role,
}

impl SessionClaims {
    /// Issue a token for these claims, valid for `ttl` from `now`
    pub fn issue(
        &self,
        key: &SigningKey,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> anyhow::Result<(Token, DateTime<Utc>)> {
        let expires_at = now
            .checked_add_signed(ttl)
            .context("Session lifetime is out of range")?;
        let token =
            Token::sign(key.as_ref(), self, expires_at).context("Failed to sign session token")?;
        Ok((token, expires_at))
    }
}

/// Recover the claims of the bearer token sent with `req`
fn verify_session(req: &HttpRequest) -> Result<SessionClaims, RestError> {
    // NOTE: Both must be registered with the application at startup
    let key = req
        .app_data::<web::Data<SigningKey>>()
        .ok_or_else(|| RestError::InternalError("Signing key not registered".into()))?;
    let clock = req
        .app_data::<web::Data<dyn Clock>>()
        .ok_or_else(|| RestError::InternalError("Clock not registered".into()))?;

    let token = bearer_token(req.headers()).map_err(RestError::Unauthorized)?;
    token
        .verify(key.get_ref().as_ref(), clock.now())
        .context("Failed to verify session token")
        .map_err(RestError::Unauthorized)
}

/// A verified session belonging to an administrator
#[derive(Debug, Clone, Copy)]
pub struct AdminSession(SessionClaims);

impl AdminSession {
    pub fn user_id(&self) -> Uuid {
        self.0.user_id
    }
}

impl FromRequest for AdminSession {
    type Error = RestError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let claims = verify_session(req);
        Box::pin(async move {
            let claims = claims?;
            if claims.role != Role::Admin {
                return Err(RestError::Forbidden("Administrator access required".into()));
            }
            Ok(AdminSession(claims))
        })
    }
}
