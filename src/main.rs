mod aggregate;
mod config;
mod db;
mod error;
mod models;
mod pipeline;
mod routes;
mod scheduler;
mod sink;
mod source;
mod trigger;

use std::sync::Arc;

use crate::{
    config::Config,
    models::AppState,
    pipeline::Pipeline,
    sink::PgSinkWriter,
    source::HttpSourceClient,
    trigger::Trigger,
};

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cfg = Config::from_env()?;
    let pool = db::connect_pg(&cfg.database_url, cfg.db_max_connections).await?;

    let source = HttpSourceClient::new(
        &cfg.upstream_base_url,
        &cfg.appointments_endpoint,
        &cfg.patients_endpoint,
        cfg.http_timeout,
    )?;
    let pipeline = Pipeline::new(Arc::new(source), Arc::new(PgSinkWriter::new(pool)));
    let trigger = Arc::new(Trigger::new(pipeline));

    match cfg.aggregation_interval {
        Some(period) => {
            scheduler::spawn(trigger.clone(), period);
        }
        None => tracing::info!("AGGREGATION_INTERVAL_SECS not set; runs are manual only"),
    }

    let app = routes::router(AppState { trigger }).layer(TraceLayer::new_for_http());

    tracing::info!("Listening on http://{}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
