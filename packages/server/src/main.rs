use std::net::SocketAddr;
use std::sync::Arc;

use common::payment::stripe::StripeProvider;
use tracing::{Level, info};

use server::config::AppConfig;
use server::database::init_db;
use server::realtime::Hub;
use server::state::AppState;
use server::{build_router, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = init_db(&config.database.url).await?;
    seed::seed_role_permissions(&db).await?;
    seed::seed_system_settings(&db).await?;
    seed::ensure_indexes(&db).await?;

    let payments = Arc::new(StripeProvider::new(config.payment.secret_key.clone()));
    let state = AppState {
        db,
        config: config.clone(),
        payments,
        hub: Hub::new(),
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
