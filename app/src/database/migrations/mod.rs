//! This module is in charge of migrations.
//! Add migrations as submodules to this module.

use super::{CountRow, Database, Transaction};
use async_trait::async_trait;

mod m0000_init;

#[async_trait]
pub trait Migration {
    fn serial_number(&self) -> i64;
    async fn run(&self, tx: &mut Transaction) -> Result<(), sqlx::Error>;
}

struct SimpleSqlMigration {
    pub serial_number: i64,
    pub sql: Vec<&'static str>,
}

#[async_trait]
impl Migration for SimpleSqlMigration {
    fn serial_number(&self) -> i64 {
        self.serial_number
    }

    async fn run(&self, tx: &mut Transaction) -> Result<(), sqlx::Error> {
        for sql in self.sql.iter() {
            sqlx::query(sql).execute(&mut **tx).await?;
        }
        Ok(())
    }
}

/// Execute all migrations on the database.
pub async fn run_migrations(db: &Database) -> Result<(), sqlx::Error> {
    prepare_migrations_table(db).await?;
    run_migration(m0000_init::migration(), db).await
}

async fn prepare_migrations_table(db: &Database) -> Result<(), sqlx::Error> {
    sqlx::query("CREATE TABLE IF NOT EXISTS migrations (serial_number INTEGER NOT NULL)")
        .execute(db)
        .await?;
    Ok(())
}

async fn run_migration(migration: impl Migration, db: &Database) -> Result<(), sqlx::Error> {
    let row = sqlx::query_as::<_, CountRow>(
        "SELECT COUNT(*) AS count FROM migrations WHERE serial_number = ?",
    )
    .bind(migration.serial_number())
    .fetch_one(db)
    .await?;

    if row.count > 0 {
        return Ok(());
    }

    log::info!("running migration {}", migration.serial_number());
    let mut transaction = db.begin().await?;
    migration.run(&mut transaction).await?;

    sqlx::query("INSERT INTO migrations VALUES (?)")
        .bind(migration.serial_number())
        .execute(&mut *transaction)
        .await?;

    transaction.commit().await
}
