use app::{
    database::Database,
    gateway::{PayoutGateway, PublishableKey},
};
use std::sync::Arc;

pub struct RocketState {
    pub db: Database,
    pub gateway: Arc<dyn PayoutGateway>,
    pub publishable_key: PublishableKey,
}
