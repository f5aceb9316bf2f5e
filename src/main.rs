use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use actix_web_prom::PrometheusMetricsBuilder;
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use healthmonitor_backend::config::AppConfig;
use healthmonitor_backend::db::{Database, MemoryDatabase, PgDatabase};
use healthmonitor_backend::routes;
use healthmonitor_backend::services::Services;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(|msg| {
        error!("{}", msg);
        io::Error::new(io::ErrorKind::InvalidInput, msg)
    })?;

    // Postgres when configured, otherwise a process-local store
    let db: Arc<dyn Database> = match &config.database_url {
        Some(url) => {
            let pg = PgDatabase::connect(url, config.database_max_connections)
                .await
                .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
            pg.migrate()
                .await
                .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
            info!("Connected to Postgres");
            Arc::new(pg)
        }
        None => {
            info!("DATABASE_URL not set, using the in-memory store");
            Arc::new(MemoryDatabase::new())
        }
    };

    let services = Services::standard(db, config.clock);
    info!(
        "Starting server at {} (UTC offset {})",
        config.bind_address,
        config.clock.offset()
    );

    // Set up Prometheus metrics
    let mut labels = HashMap::new();
    labels.insert("app".to_string(), "healthmonitor".to_string());
    let prometheus = PrometheusMetricsBuilder::new("api")
        .endpoint("/metrics")
        .const_labels(labels)
        .build()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(prometheus.clone())
            .app_data(web::Data::new(services.clone()))
            .configure(routes::configure)
    })
    .workers(config.workers)
    .bind(&config.bind_address)?
    .run()
    .await
}
