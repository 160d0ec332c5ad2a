pub mod auth;
pub mod database;
pub mod gateway;
pub mod ledger;
pub mod money;
pub mod production;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod user;

#[derive(Debug, Clone, Copy)]
pub struct QueryRange {
    pub limit: i64,
    pub offset: i64,
}
