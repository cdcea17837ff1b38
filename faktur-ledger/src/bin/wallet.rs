//! Wallet (signing) server binary

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use faktur_ledger::{api, Config};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = Config::from_env()?;
    let listen_addr = config.wallet_listen_addr.clone();
    tracing::info!("Starting Faktur wallet on {}", listen_addr);

    let data = web::Data::new(config);

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
            .configure(api::configure_wallet_routes)
    })
    .bind(&listen_addr)?
    .run()
    .await?;

    Ok(())
}
