use super::Database;
use crate::auth::PasswordHash;
use crate::gateway::SecretKey;

/// Seeds development users, named and keyed `test-1` and `test-2`, each with an empty balance and
/// no payment destination. Existing users are left alone.
///
/// Nothing is seeded unless `key` is a test-mode key, since anyone can log in as these users and
/// trigger payouts. Returns whether the users were seeded.
pub async fn seed_development_data(db: &Database, key: &SecretKey) -> Result<bool, sqlx::Error> {
    if !key.is_test_mode() {
        log::warn!("not seeding development users, payouts would use a live key");
        return Ok(false);
    }
    let mut data_tx = db.begin().await?;
    for index in 1..=2 {
        let name = format!("test-{}", index);
        sqlx::query(
            "INSERT INTO users (name, password_hash, balance) VALUES (?, ?, 0.0) ON CONFLICT (name) DO NOTHING",
        )
        .bind(&name)
        .bind(PasswordHash::generate(&name).as_str())
        .execute(&mut *data_tx)
        .await?;
    }
    data_tx.commit().await?;
    Ok(true)
}
