use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};

use serde::Serialize;

use thiserror::Error;

pub type RestResult<T> = Result<T, RestError>;

/// Postgres error code for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum RestError {
    #[error("Parse Error: {0}")]
    ParseError(String),

    #[error("Unauthorized Access")]
    Unauthorized(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal Server Error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RestError {
    /// Map a unique constraint violation to a conflict, anything else to an internal error
    pub fn conflict_on_unique(e: sqlx::Error, message: &str) -> Self {
        if is_unique_violation(&e) {
            Self::Conflict(message.into())
        } else {
            e.into()
        }
    }
}

impl From<sqlx::Error> for RestError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", e);
        Self::InternalError("Database error".into())
    }
}

/// Report a failed body, query or path extraction as a `ParseError`
pub fn extractor_error<E: std::fmt::Display>(e: E, _req: &HttpRequest) -> actix_web::Error {
    RestError::ParseError(e.to_string()).into()
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .map_or(false, |code| code == UNIQUE_VIOLATION)
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
}

impl ResponseError for RestError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ParseError(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InternalError(_) | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Self::ParseError(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg) => msg.as_str(),
            Self::Unauthorized(e) => {
                tracing::info!("Rejected request: {:#}", e);
                "Unauthorized"
            }
            Self::InternalError(_) | Self::Other(_) => {
                tracing::error!("Internal error: {:?}", self);
                "Internal Server Error"
            }
        };

        HttpResponse::build(self.status_code()).json(ErrorBody { message })
    }
}
