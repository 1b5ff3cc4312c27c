use std::io;
use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};

mod api;
mod config;
mod db;
mod docs;
mod engine;
mod error;
mod model;
mod routes;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::engine::MetricsEngine;
use crate::engine::clock::SystemClock;
use crate::store::mysql::MySqlStore;
use crate::utils::metrics_cache::MetricsCache;
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance metrics service is running"
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = Config::from_env().map_err(|e| io::Error::other(e.to_string()))?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to connect to database");
            io::Error::other(e)
        })?;

    let store = Arc::new(MySqlStore::new(pool));
    let engine = MetricsEngine::new(
        store.clone(),
        store.clone(),
        Arc::new(SystemClock::new(config.timezone)),
        config.engine_settings(),
    );
    let engine = Data::new(engine);
    let cache = Data::new(MetricsCache::new(config.metrics_cache_ttl_secs));

    // Rebuilt on an interval so deactivated codes drop out
    let filter = engine.employee_filter().clone();
    let registry = store.clone();
    let refresh = Duration::from_secs(config.employee_filter_refresh_secs.max(1));
    actix_web::rt::spawn(async move {
        let mut ticks = actix_web::rt::time::interval(refresh);
        loop {
            ticks.tick().await;
            if let Err(e) = filter.warmup(registry.as_ref()).await {
                error!(error = ?e, "Failed to warm up employee filter");
            }
        }
    });

    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(engine.clone())
            .app_data(cache.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
