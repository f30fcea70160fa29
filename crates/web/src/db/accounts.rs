//! Users and their linked GitHub accounts.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use techblog_core::{Email, UserId};

use super::RepositoryError;
use crate::models::{GithubIdentity, User};

/// Provider name stored in `accounts.provider`.
pub const GITHUB_PROVIDER: &str = "github";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: Option<String>,
    email: Option<String>,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for users and OAuth account links.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The GitHub account ID linked to a local user, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_github_account_id(
        &self,
        user_id: UserId,
    ) -> Result<Option<String>, RepositoryError> {
        let account_id: Option<String> = sqlx::query_scalar(
            r"
            SELECT provider_account_id
            FROM accounts
            WHERE user_id = $1 AND provider = $2
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(user_id)
        .bind(GITHUB_PROVIDER)
        .fetch_optional(self.pool)
        .await?;

        Ok(account_id)
    }

    /// Find or create the local user for a GitHub identity.
    ///
    /// A returning user gets their name and avatar refreshed. A first-time
    /// user is created together with the account link. If another local
    /// user already owns the email, the link is refused.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email belongs to a user
    /// linked to a different account.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn link_github(&self, identity: &GithubIdentity) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<UserId> = sqlx::query_scalar(
            r"
            SELECT user_id FROM accounts
            WHERE provider = $1 AND provider_account_id = $2
            ",
        )
        .bind(GITHUB_PROVIDER)
        .bind(&identity.account_id)
        .fetch_optional(&mut *tx)
        .await?;

        let display_name = identity.name.clone().unwrap_or_else(|| identity.login.clone());

        let row = if let Some(user_id) = existing {
            sqlx::query_as::<_, UserRow>(
                r"
                UPDATE users
                SET name = $2, image = $3, updated_at = now()
                WHERE id = $1
                RETURNING id, name, email, image, created_at, updated_at
                ",
            )
            .bind(user_id)
            .bind(&display_name)
            .bind(identity.avatar_url.as_deref())
            .fetch_one(&mut *tx)
            .await?
        } else {
            let row = sqlx::query_as::<_, UserRow>(
                r"
                INSERT INTO users (name, email, image)
                VALUES ($1, $2, $3)
                RETURNING id, name, email, image, created_at, updated_at
                ",
            )
            .bind(&display_name)
            .bind(identity.email.as_ref().map(Email::as_str))
            .bind(identity.avatar_url.as_deref())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict(
                        "email is linked to another account".to_owned(),
                    );
                }
                RepositoryError::Database(e)
            })?;

            sqlx::query(
                r"
                INSERT INTO accounts (user_id, provider, provider_account_id)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(row.id)
            .bind(GITHUB_PROVIDER)
            .bind(&identity.account_id)
            .execute(&mut *tx)
            .await?;

            row
        };

        tx.commit().await?;
        row.try_into()
    }

    /// Look up a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, image, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}
