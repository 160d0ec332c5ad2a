//! Test support: an in-memory database and a scriptable payout gateway.

use crate::database::{self, Database};
use crate::gateway::{
    GatewayError, PayoutGateway, PayoutId, PayoutRecord, PayoutRequest, PayoutStatus,
};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// A migrated, empty in-memory database.
pub async fn memory_database() -> Database {
    let db = database::connect_in_memory()
        .await
        .expect("in-memory database");
    database::run_migrations(&db).await.expect("migrations");
    db
}

/// A migrated, empty database in a file that is removed with the returned directory. Unlike
/// [`memory_database`], the pool hands out several connections.
#[cfg(test)]
pub async fn file_database() -> (Database, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temporary directory");
    let url = format!("sqlite://{}", dir.path().join("ledger.db").display());
    let db = database::connect(&url).await.expect("file database");
    database::run_migrations(&db).await.expect("migrations");
    (db, dir)
}

enum Outcome {
    Accept,
    Reject(Option<String>),
}

/// Records every payout request and answers according to how it was built.
pub struct FakeGateway {
    outcome: Outcome,
    requests: Mutex<Vec<PayoutRequest>>,
}

impl FakeGateway {
    pub fn accepting() -> Self {
        Self {
            outcome: Outcome::Accept,
            requests: Mutex::default(),
        }
    }

    pub fn rejecting(message: Option<&str>) -> Self {
        Self {
            outcome: Outcome::Reject(message.map(str::to_owned)),
            requests: Mutex::default(),
        }
    }

    pub async fn requests(&self) -> Vec<PayoutRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl PayoutGateway for FakeGateway {
    async fn create_instant_payout(
        &self,
        request: &PayoutRequest,
    ) -> Result<PayoutRecord, GatewayError> {
        let mut requests = self.requests.lock().await;
        requests.push(request.clone());
        match &self.outcome {
            Outcome::Accept => Ok(PayoutRecord {
                id: PayoutId(format!("po_test_{}", requests.len())),
                status: PayoutStatus::Pending,
                amount: request.amount,
            }),
            Outcome::Reject(message) => Err(GatewayError::Rejected {
                message: message.clone(),
            }),
        }
    }
}
