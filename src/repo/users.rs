use chrono::{DateTime, NaiveDate, Utc};

use secrecy::Secret;

use sqlx::PgExecutor;

use uuid::Uuid;

use crate::domain::{EmailAddress, Gender, Role};
use crate::lifecycle::MemberStatus;
use crate::model::{MemberUpdate, NewUser, User};
use crate::pagination::PageRequest;

use super::{like_pattern, parse_rows};

const USER_COLUMNS: &str = "u.id, u.name, u.email, u.phone, u.role, u.gender, u.birth_date, u.created_at";

/// Users of role $1, optionally narrowed by search term ($2) and current activity ($3 on day $4)
const USER_FILTER: &str = "u.role = $1 \
     and ($2::text is null or u.name ilike $2 or u.email ilike $2 or u.phone ilike $2) \
     and ($3::boolean is null or exists( \
         select 1 from subscriptions s \
         where s.user_id = u.id and s.status = 'active' \
           and s.start_date <= $4 and (s.end_date is null or s.end_date >= $4) \
     ) = $3)";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    role: String,
    gender: Option<String>,
    birth_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            role: row.role.parse()?,
            gender: row.gender.as_deref().map(str::parse::<Gender>).transpose()?,
            birth_date: row.birth_date,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// A user along with their stored password hash
#[derive(Debug)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: Secret<String>,
}

/// Criteria for listing users of one role
#[derive(Debug)]
pub struct UserFilter {
    pub role: Role,
    /// Case-insensitive substring of name, email or phone
    pub search: Option<String>,
    /// Whether the user holds a running subscription
    pub status: Option<MemberStatus>,
}

impl UserFilter {
    /// Every member
    pub fn members() -> Self {
        Self {
            role: Role::Member,
            search: None,
            status: None,
        }
    }

    /// Every coach
    pub fn coaches() -> Self {
        Self {
            role: Role::Coach,
            ..Self::members()
        }
    }

    fn pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(like_pattern)
    }

    fn active(&self) -> Option<bool> {
        self.status.map(|status| status == MemberStatus::Active)
    }
}

/// Repository for users of every role
pub struct UsersRepo;

impl UsersRepo {
    #[tracing::instrument(name = "Insert user", skip(executor, new_user))]
    pub async fn insert<'con>(
        executor: impl PgExecutor<'con>,
        new_user: &NewUser,
    ) -> sqlx::Result<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "insert into users(name, email, password_hash, phone, role, gender, birth_date) \
             values ($1, $2, $3, $4, $5, $6, $7) returning id",
        )
        .bind(new_user.name.as_ref())
        .bind(new_user.email.as_ref())
        .bind(&new_user.password_hash)
        .bind(&new_user.phone)
        .bind(new_user.role.as_str())
        .bind(new_user.gender.map(|g| g.as_str()))
        .bind(new_user.birth_date)
        .fetch_one(executor)
        .await
    }

    #[tracing::instrument(name = "Fetch user by id", skip(executor))]
    pub async fn fetch_by_id<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<Option<User>> {
        let sql = format!("select {} from users u where u.id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(row.and_then(|row| parse_rows(vec![row]).pop()))
    }

    #[tracing::instrument(name = "Fetch user credentials by email", skip(executor))]
    pub async fn fetch_credentials_by_email<'con>(
        executor: impl PgExecutor<'con>,
        email: &EmailAddress,
    ) -> sqlx::Result<Option<StoredCredentials>> {
        let sql = format!(
            "select {}, u.password_hash from users u where u.email = $1",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, CredentialsRow>(&sql)
            .bind(email.as_ref())
            .fetch_optional(executor)
            .await?;

        Ok(row.and_then(|row| {
            let password_hash = Secret::new(row.password_hash);
            parse_rows::<_, User>(vec![row.user])
                .pop()
                .map(|user| StoredCredentials {
                    user,
                    password_hash,
                })
        }))
    }

    /// Replace a member's profile fields
    #[tracing::instrument(name = "Update member", skip(executor, update))]
    pub async fn update_member<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
        update: &MemberUpdate,
    ) -> sqlx::Result<Option<User>> {
        let sql = format!(
            "update users u set name = $2, email = $3, phone = $4, gender = $5, birth_date = $6 \
             where u.id = $1 and u.role = 'member' returning {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(update.name.as_ref())
            .bind(update.email.as_ref())
            .bind(&update.phone)
            .bind(update.gender.map(|g| g.as_str()))
            .bind(update.birth_date)
            .fetch_optional(executor)
            .await?;

        Ok(row.and_then(|row| parse_rows(vec![row]).pop()))
    }

    /// Delete a member along with their subscriptions.
    /// Returns `false` when no member has that id.
    #[tracing::instrument(name = "Delete member", skip(executor))]
    pub async fn delete_member<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query("delete from users where id = $1 and role = 'member'")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// One page of users, newest first
    #[tracing::instrument(name = "Fetch page of users", skip(executor))]
    pub async fn fetch_page<'con>(
        executor: impl PgExecutor<'con>,
        filter: &UserFilter,
        today: NaiveDate,
        page: PageRequest,
    ) -> sqlx::Result<Vec<User>> {
        let sql = format!(
            "select {} from users u where {} order by u.created_at desc, u.id limit $5 offset $6",
            USER_COLUMNS, USER_FILTER
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(filter.role.as_str())
            .bind(filter.pattern())
            .bind(filter.active())
            .bind(today)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(executor)
            .await?;

        Ok(parse_rows(rows))
    }

    #[tracing::instrument(name = "Count users", skip(executor))]
    pub async fn count<'con>(
        executor: impl PgExecutor<'con>,
        filter: &UserFilter,
        today: NaiveDate,
    ) -> sqlx::Result<i64> {
        let sql = format!("select count(*) from users u where {}", USER_FILTER);
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.role.as_str())
            .bind(filter.pattern())
            .bind(filter.active())
            .bind(today)
            .fetch_one(executor)
            .await
    }
}
