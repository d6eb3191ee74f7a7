//! `PostgreSQL` address repository.

use async_trait::async_trait;
use sqlx::PgPool;

use greencart_core::{Address, AddressId, Email, UserId, ValidAddress};

use super::{AddressRepository, RepositoryError};

const ADDRESS_COLUMNS: &str =
    "id, user_id, first_name, last_name, email, street, city, state, zipcode, country, phone";

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: i32,
    user_id: i32,
    first_name: String,
    last_name: String,
    email: String,
    street: String,
    city: String,
    state: String,
    zipcode: String,
    country: String,
    phone: String,
}

impl TryFrom<AddressRow> for Address {
    type Error = RepositoryError;

    fn try_from(row: AddressRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in address {}: {e}", row.id))
        })?;

        Ok(Self {
            id: AddressId::new(row.id),
            user_id: UserId::new(row.user_id),
            first_name: row.first_name,
            last_name: row.last_name,
            email,
            street: row.street,
            city: row.city,
            state: row.state,
            zipcode: row.zipcode,
            country: row.country,
            phone: row.phone,
        })
    }
}

fn into_addresses(rows: Vec<AddressRow>) -> Result<Vec<Address>, RepositoryError> {
    rows.into_iter().map(Address::try_from).collect()
}

/// Addresses stored in `PostgreSQL`.
pub struct PgAddressRepository {
    pool: PgPool,
}

impl PgAddressRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AddressRepository for PgAddressRepository {
    async fn create(
        &self,
        user_id: UserId,
        address: ValidAddress,
    ) -> Result<Address, RepositoryError> {
        sqlx::query_as::<_, AddressRow>(&format!(
            "INSERT INTO addresses
                 (user_id, first_name, last_name, email, street, city, state, zipcode, country, phone)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&address.first_name)
        .bind(&address.last_name)
        .bind(address.email.as_str())
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zipcode)
        .bind(&address.country)
        .bind(&address.phone)
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        into_addresses(rows)
    }

    async fn get(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Address::try_from)
        .transpose()
    }

    async fn get_many(&self, ids: &[AddressId]) -> Result<Vec<Address>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        into_addresses(rows)
    }

    async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
