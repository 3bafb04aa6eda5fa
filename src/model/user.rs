use chrono::{DateTime, NaiveDate, Utc};

use serde::Serialize;

use uuid::Uuid;

use crate::domain::{EmailAddress, Gender, PersonName, Role};

/// New user request, password already hashed
#[derive(Debug)]
pub struct NewUser {
    pub name: PersonName,
    pub email: EmailAddress,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: Role,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
}

/// Stored user record, without credentials
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Replacement profile fields for an existing member
#[derive(Debug)]
pub struct MemberUpdate {
    pub name: PersonName,
    pub email: EmailAddress,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
}
