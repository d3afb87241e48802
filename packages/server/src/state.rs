use std::sync::Arc;

use common::payment::PaymentProvider;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::realtime::Hub;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub payments: Arc<dyn PaymentProvider>,
    pub hub: Hub,
}
