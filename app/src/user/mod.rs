use crate::{auth, database::Database};
use thiserror::Error;

mod entities;

pub use entities::{Id, Name, PaymentDestination, User};

pub async fn get(grant: &auth::Grant, db: &Database) -> Result<Option<User>, sqlx::Error> {
    queries::get(db, grant.user_id).await
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("user already exists")]
    AlreadyExists,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Inserts a new user with a zero balance. A taken name is reported as
/// [`Error::AlreadyExists`] and leaves the existing row untouched.
pub(crate) async fn create(
    db: &Database,
    name: &Name,
    password_hash: &auth::PasswordHash,
) -> Result<Id, Error> {
    match queries::insert(db, name, password_hash).await {
        Ok(id) => Ok(id),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(Error::AlreadyExists),
        Err(e) => Err(e.into()),
    }
}

pub(crate) async fn find_by_name(db: &Database, name: &str) -> Result<Option<User>, sqlx::Error> {
    queries::find_by_name(db, name).await
}

pub(crate) mod queries {
    use super::{Id, Name, PaymentDestination, User};
    use crate::auth::PasswordHash;
    use crate::database::Database;
    use crate::money;

    pub(super) async fn get(db: &Database, id: Id) -> Result<Option<User>, sqlx::Error> {
        Ok(sqlx::query_as::<_, UserRow>(
            "SELECT id, name, balance, stripe_pm_id FROM users WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(db)
        .await?
        .map(|row| row.into_entity()))
    }

    pub(super) async fn find_by_name(db: &Database, name: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(sqlx::query_as::<_, UserRow>(
            "SELECT id, name, balance, stripe_pm_id FROM users WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(db)
        .await?
        .map(|row| row.into_entity()))
    }

    pub(super) async fn insert(
        db: &Database,
        name: &Name,
        password_hash: &PasswordHash,
    ) -> Result<Id, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO users (name, password_hash, balance) VALUES (?, ?, 0.0)")
                .bind(name.as_str())
                .bind(password_hash.as_str())
                .execute(db)
                .await?;
        Ok(Id(result.last_insert_rowid()))
    }

    /// Returns the stored hash and the user id, if the user exists.
    pub(crate) async fn get_credentials(
        db: &Database,
        name: &str,
    ) -> Result<Option<(Id, String)>, sqlx::Error> {
        Ok(sqlx::query_as::<_, CredentialsRow>(
            "SELECT id, password_hash FROM users WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(db)
        .await?
        .map(|row| (Id(row.id), row.password_hash)))
    }

    #[derive(sqlx::FromRow, Debug)]
    struct UserRow {
        id: i64,
        name: String,
        balance: f64,
        stripe_pm_id: Option<String>,
    }

    impl UserRow {
        fn into_entity(self) -> User {
            User {
                id: Id(self.id),
                name: Name(self.name),
                balance: money::Amount(self.balance),
                payment_destination: self.stripe_pm_id.map(PaymentDestination),
            }
        }
    }

    #[derive(sqlx::FromRow)]
    struct CredentialsRow {
        id: i64,
        password_hash: String,
    }
}
