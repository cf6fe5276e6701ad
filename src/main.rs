//! Boutique - clothing storefront backend

use anyhow::Result;
use boutique::api::{router, AppState};
use boutique::service::{BasketService, ProductService};
use boutique::store::PgBasketStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&std::env::var("DATABASE_URL")?)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let products = ProductService::new(db.clone());
    let basket = BasketService::new(PgBasketStore::new(db), products.clone());
    let app = router(AppState { products, basket });

    let port = std::env::var("PORT").unwrap_or_else(|_| "8083".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!("boutique listening on 0.0.0.0:{port}");
    axum::serve(listener, app).await?;
    Ok(())
}
