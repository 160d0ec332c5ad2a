//! Handles user registration and authentication. Authentication is proven by possession of a
//! [`Grant`], which every other module asks for before touching a user's data.

use crate::{
    database::Database,
    user::{self, queries},
};

mod entities;

pub use entities::{Error, Grant, PasswordHash};

/// Creates a new user and returns a grant for it, so registration behaves like a login.
pub async fn register(db: &Database, name: &str, password: &str) -> Result<Grant, user::Error> {
    let name = name.trim();
    if name.is_empty() || password.is_empty() {
        return Err(user::Error::InvalidInput("name and password are required"));
    }
    let name = user::Name(name.to_owned());
    let user_id = user::create(db, &name, &PasswordHash::generate(password)).await?;
    log::info!("registered user {:?} as {:?}", name, user_id);
    Ok(Grant { user_id, name })
}

/// Checks a name and password pair against the stored hash.
pub async fn authenticate(db: &Database, name: &str, password: &str) -> Result<Grant, Error> {
    let (user_id, stored) = queries::get_credentials(db, name)
        .await?
        .ok_or(Error::AccessDenied)?;
    if PasswordHash::generate(password).matches(&stored) {
        Ok(Grant {
            user_id,
            name: user::Name(name.to_owned()),
        })
    } else {
        Err(Error::AccessDenied)
    }
}

/// Resolves the user name carried by an established session.
pub async fn session_grant(db: &Database, name: &str) -> Result<Grant, Error> {
    let user = user::find_by_name(db, name)
        .await?
        .ok_or(Error::AccessDenied)?;
    Ok(Grant {
        user_id: user.id,
        name: user.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_database;

    #[tokio::test]
    async fn register_then_authenticate() {
        let db = memory_database().await;
        let registered = register(&db, "alice", "s3cret").await.unwrap();

        let grant = authenticate(&db, "alice", "s3cret").await.unwrap();
        assert_eq!(grant.user_id, registered.user_id);
        assert_eq!(grant.name, user::Name("alice".to_owned()));

        assert!(matches!(
            authenticate(&db, "alice", "wrong").await,
            Err(Error::AccessDenied)
        ));
        assert!(matches!(
            authenticate(&db, "bob", "s3cret").await,
            Err(Error::AccessDenied)
        ));
    }

    #[tokio::test]
    async fn register_trims_name() {
        let db = memory_database().await;
        let grant = register(&db, "  carol ", "pw").await.unwrap();
        assert_eq!(grant.name.as_str(), "carol");
        assert!(authenticate(&db, "carol", "pw").await.is_ok());
    }

    #[tokio::test]
    async fn register_rejects_empty_input() {
        let db = memory_database().await;
        assert!(matches!(
            register(&db, "   ", "pw").await,
            Err(user::Error::InvalidInput(_))
        ));
        assert!(matches!(
            register(&db, "dave", "").await,
            Err(user::Error::InvalidInput(_))
        ));
        assert!(user::find_by_name(&db, "dave").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_registration_keeps_first_user() {
        let db = memory_database().await;
        let first = register(&db, "erin", "first").await.unwrap();

        assert!(matches!(
            register(&db, "erin", "second").await,
            Err(user::Error::AlreadyExists)
        ));

        let grant = authenticate(&db, "erin", "first").await.unwrap();
        assert_eq!(grant.user_id, first.user_id);
        assert!(authenticate(&db, "erin", "second").await.is_err());
    }

    #[tokio::test]
    async fn session_grant_requires_existing_user() {
        let db = memory_database().await;
        register(&db, "frank", "pw").await.unwrap();
        assert!(session_grant(&db, "frank").await.is_ok());
        assert!(matches!(
            session_grant(&db, "ghost").await,
            Err(Error::AccessDenied)
        ));
    }
}
