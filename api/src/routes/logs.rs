use super::{Range, RangeError};
use crate::error::JsonResult;
use crate::state::RocketState;
use crate::{access, error};
use chrono::{DateTime, Utc};
use rocket::{get, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Serialize, JsonSchema)]
struct LogModel {
    /// Time of the balance change.
    timestamp: DateTime<Utc>,
    /// What caused the change, e.g. `Cycle 2/5`.
    description: String,
    /// Signed change applied to the balance.
    amount: f64,
    balance_before: f64,
    balance_after: f64,
    /// Payout identifier, present on withdrawal entries.
    payout_id: Option<String>,
}

impl LogModel {
    fn from_entity(entry: &app::ledger::LogEntry) -> Self {
        Self {
            timestamp: entry.timestamp,
            description: entry.description.clone(),
            amount: entry.amount.0,
            balance_before: entry.balance_before.0,
            balance_after: entry.balance_after.0,
            payout_id: entry.payout_id.as_ref().map(|id| id.0.clone()),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct LogsResponse {
    logs: Vec<LogModel>,
}

/// List your balance changes, newest first.
#[openapi(tag = "Ledger")]
#[get("/logs?<range..>")]
pub(super) async fn list(
    state: &State<RocketState>,
    guard: access::SessionGuard,
    range: Range,
) -> JsonResult<LogsResponse, RangeError> {
    let logs = app::ledger::list_logs(&state.db, &guard.grant().name, range.query_range()?)
        .await
        .map_err(|e| error::internal_server_error(RangeError::Unknown, e.to_string()))?;
    Ok(Json(LogsResponse {
        logs: logs.iter().map(LogModel::from_entity).collect(),
    }))
}
