//! `PostgreSQL` user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use greencart_core::{CartItems, CartRevision, Email, User, UserId};

use super::{CartWrite, NewUser, RepositoryError, UserRepository, conflict_on_unique};

const USER_COLUMNS: &str = "id, name, email, is_seller, cart, cart_revision, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    is_seller: bool,
    cart: Json<CartItems>,
    cart_revision: i64,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            is_seller: row.is_seller,
            cart: row.cart.0,
            cart_revision: revision_from_db(row.cart_revision)?,
            created_at: row.created_at,
        })
    }
}

fn revision_from_db(value: i64) -> Result<CartRevision, RepositoryError> {
    u64::try_from(value)
        .map(CartRevision::new)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative cart revision {value}")))
}

fn revision_to_db(revision: CartRevision) -> i64 {
    i64::try_from(revision.get()).unwrap_or(i64::MAX)
}

/// Users stored in `PostgreSQL`.
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (name, email, password_hash, is_seller)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.is_seller)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        row.try_into()
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn get_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithPasswordRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    async fn update_cart(
        &self,
        id: UserId,
        cart: &CartItems,
        revision: Option<CartRevision>,
    ) -> Result<CartWrite, RepositoryError> {
        let Some(revision) = revision else {
            let stored: Option<i64> = sqlx::query_scalar(
                "UPDATE users SET cart = $2, updated_at = now()
                 WHERE id = $1
                 RETURNING cart_revision",
            )
            .bind(id)
            .bind(Json(cart))
            .fetch_optional(&self.pool)
            .await?;

            let stored = stored.ok_or(RepositoryError::NotFound)?;
            return Ok(CartWrite::Applied(revision_from_db(stored)?));
        };

        let applied: Option<i64> = sqlx::query_scalar(
            "UPDATE users SET cart = $2, cart_revision = $3, updated_at = now()
             WHERE id = $1 AND cart_revision < $3
             RETURNING cart_revision",
        )
        .bind(id)
        .bind(Json(cart))
        .bind(revision_to_db(revision))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(stored) = applied {
            return Ok(CartWrite::Applied(revision_from_db(stored)?));
        }

        // Either the user is gone or the write was stale.
        let current: Option<i64> =
            sqlx::query_scalar("SELECT cart_revision FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match current {
            Some(stored) => Ok(CartWrite::Stale(revision_from_db(stored)?)),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn clear_cart(&self, id: UserId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE users SET cart = '{}'::jsonb, updated_at = now() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn set_seller(&self, email: &Email, is_seller: bool) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET is_seller = $2, updated_at = now()
             WHERE email = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(is_seller)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()
    }
}
