use crate::database::Database;
use crate::gateway::PayoutId;
use crate::money::Amount;
use crate::user::{self, PaymentDestination};
use crate::QueryRange;

mod entities;

pub use entities::{Balance, Error, LogEntry, LogId, WITHDRAWAL_DESCRIPTION};

pub async fn get_balance(db: &Database, name: &user::Name) -> Result<Option<Amount>, Error> {
    Ok(queries::get_balance(db, name).await?.map(|b| b.amount()))
}

pub async fn get_payment_destination(
    db: &Database,
    name: &user::Name,
) -> Result<Option<PaymentDestination>, Error> {
    Ok(queries::get_payment_destination(db, name).await?)
}

/// Overwrites the stored payment destination. Only a blank destination is rejected.
pub async fn set_payment_destination(
    db: &Database,
    name: &user::Name,
    destination: &PaymentDestination,
) -> Result<(), Error> {
    if destination.0.trim().is_empty() {
        return Err(Error::InvalidInput("payment destination is required"));
    }
    if !queries::set_payment_destination(db, name, destination).await? {
        return Err(Error::UnknownUser);
    }
    log::info!("payment destination updated for {}", name);
    Ok(())
}

/// Adds `delta` to the balance and appends the matching log row. Returns the balance before and
/// after the change.
///
/// The balance is read before the transaction opens, so the transaction starts with a write and
/// waits for SQLite's write lock instead of failing with "database is locked". Concurrent calls
/// for the same user can lose updates.
pub async fn apply_delta(
    db: &Database,
    name: &user::Name,
    delta: Amount,
    description: &str,
) -> Result<(Amount, Amount), Error> {
    let mut balance = queries::get_balance(db, name)
        .await?
        .ok_or(Error::UnknownUser)?;
    let entry = balance.apply(delta, description);
    let mut data_tx = db.begin().await?;
    queries::update_balance(&mut data_tx, &balance).await?;
    queries::insert_log(&mut data_tx, &entry).await?;
    data_tx.commit().await?;
    Ok((entry.balance_before, entry.balance_after))
}

pub async fn zero_balance(db: &Database, name: &user::Name) -> Result<(), Error> {
    let mut data_tx = db.begin().await?;
    queries::update_balance(&mut data_tx, &Balance::new(name.clone(), Amount::ZERO)).await?;
    data_tx.commit().await?;
    Ok(())
}

/// Clears the balance after a payout of `final_balance` and appends the withdrawal row carrying
/// the payout id.
pub async fn record_withdrawal(
    db: &Database,
    name: &user::Name,
    final_balance: Amount,
    payout_id: &PayoutId,
) -> Result<LogEntry, Error> {
    let mut balance = Balance::new(name.clone(), final_balance);
    let entry = balance.withdraw_all(payout_id);
    let mut data_tx = db.begin().await?;
    queries::update_balance(&mut data_tx, &balance).await?;
    queries::insert_log(&mut data_tx, &entry).await?;
    data_tx.commit().await?;
    Ok(entry)
}

pub async fn list_logs(
    db: &Database,
    name: &user::Name,
    range: QueryRange,
) -> Result<Vec<LogEntry>, Error> {
    Ok(queries::list_logs(db, name, range).await?)
}

mod queries {
    use super::{Balance, LogEntry, LogId};
    use crate::database::{self, Database};
    use crate::gateway::PayoutId;
    use crate::money::Amount;
    use crate::user::{self, PaymentDestination};
    use crate::QueryRange;
    use chrono::{DateTime, Utc};
    use const_format::formatcp;
    use sqlx::SqliteExecutor;

    const COLUMNS: &str =
        "id, user_name, timestamp, description, amount, balance_before, balance_after, payout_id";

    pub(super) async fn get_balance<'e>(
        executor: impl SqliteExecutor<'e>,
        name: &user::Name,
    ) -> Result<Option<Balance>, sqlx::Error> {
        Ok(
            sqlx::query_as::<_, BalanceRow>("SELECT name, balance FROM users WHERE name = ?")
                .bind(name.as_str())
                .fetch_optional(executor)
                .await?
                .map(|row| row.into_entity()),
        )
    }

    pub(super) async fn update_balance(
        data_tx: &mut database::Transaction,
        balance: &Balance,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET balance = ? WHERE name = ?")
            .bind(balance.amount().0)
            .bind(balance.name().as_str())
            .execute(&mut **data_tx)
            .await?;
        Ok(())
    }

    pub(super) async fn get_payment_destination(
        db: &Database,
        name: &user::Name,
    ) -> Result<Option<PaymentDestination>, sqlx::Error> {
        Ok(sqlx::query_as::<_, DestinationRow>(
            "SELECT stripe_pm_id FROM users WHERE name = ?",
        )
        .bind(name.as_str())
        .fetch_optional(db)
        .await?
        .and_then(|row| row.stripe_pm_id)
        .map(PaymentDestination))
    }

    /// Returns false if no such user exists.
    pub(super) async fn set_payment_destination(
        db: &Database,
        name: &user::Name,
        destination: &PaymentDestination,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET stripe_pm_id = ? WHERE name = ?")
            .bind(&destination.0)
            .bind(name.as_str())
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub(super) async fn insert_log(
        data_tx: &mut database::Transaction,
        entry: &LogEntry,
    ) -> Result<LogId, sqlx::Error> {
        let result = sqlx::query(
            r#"INSERT INTO logs (user_name, timestamp, description, amount, balance_before, balance_after, payout_id)
                VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(entry.user_name.as_str())
        .bind(entry.timestamp)
        .bind(&entry.description)
        .bind(entry.amount.0)
        .bind(entry.balance_before.0)
        .bind(entry.balance_after.0)
        .bind(entry.payout_id.as_ref().map(|id| id.0.as_str()))
        .execute(&mut **data_tx)
        .await?;
        Ok(LogId(result.last_insert_rowid()))
    }

    pub(super) async fn list_logs(
        db: &Database,
        name: &user::Name,
        range: QueryRange,
    ) -> Result<Vec<LogEntry>, sqlx::Error> {
        Ok(sqlx::query_as::<_, LogRow>(formatcp!(
            "SELECT {} FROM logs WHERE user_name = ? ORDER BY id DESC LIMIT ? OFFSET ?",
            COLUMNS
        ))
        .bind(name.as_str())
        .bind(range.limit)
        .bind(range.offset)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(|row| row.into_entity())
        .collect())
    }

    #[derive(sqlx::FromRow, Debug)]
    struct BalanceRow {
        name: String,
        balance: f64,
    }

    impl BalanceRow {
        fn into_entity(self) -> Balance {
            Balance::new(user::Name(self.name), Amount(self.balance))
        }
    }

    #[derive(sqlx::FromRow, Debug)]
    struct DestinationRow {
        stripe_pm_id: Option<String>,
    }

    // Every column of the logs table is nullable.
    #[derive(sqlx::FromRow, Debug)]
    struct LogRow {
        id: i64,
        user_name: Option<String>,
        timestamp: Option<DateTime<Utc>>,
        description: Option<String>,
        amount: Option<f64>,
        balance_before: Option<f64>,
        balance_after: Option<f64>,
        payout_id: Option<String>,
    }

    impl LogRow {
        fn into_entity(self) -> LogEntry {
            LogEntry {
                id: Some(LogId(self.id)),
                user_name: user::Name(self.user_name.unwrap_or_default()),
                timestamp: self.timestamp.unwrap_or_default(),
                description: self.description.unwrap_or_default(),
                amount: Amount(self.amount.unwrap_or_default()),
                balance_before: Amount(self.balance_before.unwrap_or_default()),
                balance_after: Amount(self.balance_after.unwrap_or_default()),
                payout_id: self.payout_id.map(PayoutId),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth;
    use crate::testing::{file_database, memory_database};
    use std::sync::Arc;

    const ALL: QueryRange = QueryRange {
        limit: 100,
        offset: 0,
    };

    async fn setup() -> (Database, user::Name) {
        let db = memory_database().await;
        let grant = auth::register(&db, "alice", "pw").await.unwrap();
        (db, grant.name)
    }

    #[tokio::test]
    async fn new_users_start_at_zero() {
        let (db, name) = setup().await;
        assert_eq!(get_balance(&db, &name).await.unwrap(), Some(Amount::ZERO));
        assert_eq!(
            get_balance(&db, &user::Name("nobody".to_owned()))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn apply_delta_appends_exactly_one_row() {
        let (db, name) = setup().await;
        apply_delta(&db, &name, Amount(500.0), "seed").await.unwrap();

        let (before, after) = apply_delta(&db, &name, Amount(1000.0), "Cycle 1/1")
            .await
            .unwrap();
        assert_eq!((before, after), (Amount(500.0), Amount(1500.0)));
        assert_eq!(get_balance(&db, &name).await.unwrap(), Some(Amount(1500.0)));

        let logs = list_logs(&db, &name, ALL).await.unwrap();
        assert_eq!(logs.len(), 2);
        let latest = &logs[0];
        assert_eq!(latest.description, "Cycle 1/1");
        assert_eq!(latest.amount, Amount(1000.0));
        assert_eq!(latest.balance_before, Amount(500.0));
        assert_eq!(latest.balance_after, Amount(1500.0));
        assert_eq!(latest.user_name, name);
        assert!(latest.payout_id.is_none());
    }

    #[tokio::test]
    async fn apply_delta_for_unknown_user_fails() {
        let (db, _) = setup().await;
        let ghost = user::Name("ghost".to_owned());
        assert!(matches!(
            apply_delta(&db, &ghost, Amount(1.0), "x").await,
            Err(Error::UnknownUser)
        ));
        assert!(list_logs(&db, &ghost, ALL).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn payment_destination_is_overwritten() {
        let (db, name) = setup().await;
        assert_eq!(get_payment_destination(&db, &name).await.unwrap(), None);

        let first = PaymentDestination("pm_first".to_owned());
        let second = PaymentDestination("pm_second".to_owned());
        set_payment_destination(&db, &name, &first).await.unwrap();
        set_payment_destination(&db, &name, &second).await.unwrap();
        assert_eq!(
            get_payment_destination(&db, &name).await.unwrap(),
            Some(second)
        );
    }

    #[tokio::test]
    async fn blank_payment_destination_is_rejected() {
        let (db, name) = setup().await;
        assert!(matches!(
            set_payment_destination(&db, &name, &PaymentDestination("  ".to_owned())).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            set_payment_destination(
                &db,
                &user::Name("ghost".to_owned()),
                &PaymentDestination("pm_1".to_owned())
            )
            .await,
            Err(Error::UnknownUser)
        ));
    }

    #[tokio::test]
    async fn record_withdrawal_zeroes_balance() {
        let (db, name) = setup().await;
        apply_delta(&db, &name, Amount(42.5), "Cycle 1/1")
            .await
            .unwrap();

        let entry = record_withdrawal(&db, &name, Amount(42.5), &PayoutId("po_1".to_owned()))
            .await
            .unwrap();
        assert_eq!(entry.description, WITHDRAWAL_DESCRIPTION);
        assert_eq!(get_balance(&db, &name).await.unwrap(), Some(Amount::ZERO));

        let logs = list_logs(&db, &name, ALL).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].payout_id, Some(PayoutId("po_1".to_owned())));
        assert_eq!(logs[0].amount, Amount(-42.5));
        assert_eq!(logs[0].balance_before, Amount(42.5));
        assert_eq!(logs[0].balance_after, Amount::ZERO);
    }

    #[tokio::test]
    async fn zero_balance_does_not_log() {
        let (db, name) = setup().await;
        apply_delta(&db, &name, Amount(7.0), "Cycle 1/1").await.unwrap();
        zero_balance(&db, &name).await.unwrap();
        assert_eq!(get_balance(&db, &name).await.unwrap(), Some(Amount::ZERO));
        assert_eq!(list_logs(&db, &name, ALL).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_logs_pages_newest_first() {
        let (db, name) = setup().await;
        for i in 1..=3 {
            apply_delta(&db, &name, Amount(1.0), &format!("Cycle {}/3", i))
                .await
                .unwrap();
        }
        let page = list_logs(
            &db,
            &name,
            QueryRange {
                limit: 2,
                offset: 1,
            },
        )
        .await
        .unwrap();
        let descriptions: Vec<_> = page.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, vec!["Cycle 2/3", "Cycle 1/3"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_users_do_not_interfere() {
        let (db, _dir) = file_database().await;
        let mut names = Vec::new();
        for i in 0..8 {
            let grant = auth::register(&db, &format!("user-{}", i), "pw")
                .await
                .unwrap();
            names.push(grant.name);
        }

        let tasks: Vec<_> = names
            .iter()
            .cloned()
            .map(|name| {
                let db = db.clone();
                tokio::spawn(async move {
                    for cycle in 1..=20 {
                        apply_delta(&db, &name, Amount(1.0), &format!("Cycle {}/20", cycle))
                            .await?;
                    }
                    Ok::<_, Error>(())
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        for name in &names {
            assert_eq!(get_balance(&db, name).await.unwrap(), Some(Amount(20.0)));
            assert_eq!(list_logs(&db, name, ALL).await.unwrap().len(), 20);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_deltas_for_one_user_all_commit() {
        let (db, _dir) = file_database().await;
        let name = Arc::new(auth::register(&db, "alice", "pw").await.unwrap().name);

        let tasks: Vec<_> = (1..=20)
            .map(|cycle| {
                let db = db.clone();
                let name = name.clone();
                tokio::spawn(async move {
                    apply_delta(&db, &name, Amount(1.0), &format!("Cycle {}/20", cycle)).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        // Every call logs its row, but racing read-then-write cycles may overwrite each other.
        assert_eq!(list_logs(&db, &name, ALL).await.unwrap().len(), 20);
        let balance = get_balance(&db, &name).await.unwrap().unwrap();
        assert!(balance >= Amount(1.0) && balance <= Amount(20.0));
    }
}
