//! This library contains definitions for the API layer: the HTML login flow and the JSON API.

use app::{
    database::Database,
    gateway::{PayoutGateway, PublishableKey},
};
use rocket::{Build, Rocket};
use state::RocketState;
use std::sync::Arc;

mod access;
mod error;
mod pages;
mod routes;
mod state;

pub fn register(
    rocket: Rocket<Build>,
    db: Database,
    gateway: Arc<dyn PayoutGateway>,
    publishable_key: PublishableKey,
) -> Rocket<Build> {
    routes::register(
        rocket,
        RocketState {
            db,
            gateway,
            publishable_key,
        },
    )
}
