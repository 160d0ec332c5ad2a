use rocket::{http::Status, serde::json::Json};
use schemars::JsonSchema;
use serde::Serialize;

/// Body of every JSON error response.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Error<E: Serialize> {
    /// Human readable description of the failure.
    pub error: String,
    /// Machine readable error code.
    pub code: E,
}

impl<E: Serialize> Error<E> {
    fn new(description: String, code: E) -> Self {
        Self {
            error: description,
            code,
        }
    }
}

pub type JsonError<E> = (Status, Json<Error<E>>);

pub type JsonResult<T, E> = Result<Json<T>, JsonError<E>>;

pub fn bad_request<E: Serialize>(error: E, description: String) -> JsonError<E> {
    (Status::BadRequest, Json(Error::new(description, error)))
}

pub fn internal_server_error<E: Serialize>(error: E, description: String) -> JsonError<E> {
    log::error!("internal server error: {}", description);
    (Status::InternalServerError, Json(Error::new(description, error)))
}

/// Codes used by the catchers, for failures that happen before a route runs.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Unhandled {
    Unauthenticated,
    NotFound,
    MalformedRequest,
    Unknown,
}

pub fn unhandled(code: Unhandled, description: &str) -> Json<Error<Unhandled>> {
    Json(Error::new(description.to_owned(), code))
}
