use super::{Migration, SimpleSqlMigration};

/// Tables are created with `IF NOT EXISTS` so that databases written before the migrations table
/// existed are adopted without changes.
pub fn migration() -> impl Migration {
    SimpleSqlMigration {
        serial_number: 0,
        sql: vec![
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                balance REAL NOT NULL DEFAULT 0.0,
                stripe_pm_id TEXT
            )"#,
            // user_name is denormalized, not a foreign key
            r#"
            CREATE TABLE IF NOT EXISTS logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_name TEXT,
                timestamp TEXT,
                description TEXT,
                amount REAL,
                balance_before REAL,
                balance_after REAL,
                payout_id TEXT
            )"#,
            r#"CREATE INDEX IF NOT EXISTS log_user_name ON logs (user_name)"#,
        ],
    }
}
