use actix_web::http::header::{self, HeaderMap};

use anyhow::Context;

use secrecy::Secret;

use serde::Deserialize;

use crate::crypto::Token;

const BEARER_AUTH_PREFIX: &str = "Bearer ";

/// Login form credentials
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: Secret<String>,
}

/// Extract a session token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> anyhow::Result<Token> {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .context("Missing authorization in header")?
        .to_str()
        .context("Authorization header is not valid ASCII")?;

    header_value
        .strip_prefix(BEARER_AUTH_PREFIX)
        .context("Authorization scheme not bearer")?
        .parse()
        .context("Missing token in authorization")
}
