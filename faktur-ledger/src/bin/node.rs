//! Ledger node binary

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use faktur_ledger::{api, Config, Ledger};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Faktur ledger node");

    // Load configuration
    let config = Config::from_env()?;
    let listen_addr = config.listen_addr.clone();

    // Open ledger
    let ledger = Arc::new(Ledger::open(config).await?);
    tracing::info!("Ledger {} listening on {}", ledger.node_id(), listen_addr);

    let data = web::Data::new(ledger);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(api::configure_node_routes)
    })
    .bind(&listen_addr)?
    .run()
    .await?;

    tracing::info!("Shutting down ledger node");
    Ok(())
}
