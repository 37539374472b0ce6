use std::sync::Arc;

use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use tienda::Config;
use tienda::app::{AppState, EVENT_CAPACITY, app};
use tienda::gate::StaticPolicy;
use tienda::model::{Cart, Product};
use tienda::store::FileStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tienda=debug,info")),
        )
        .init();

    let config = Config::from_env();
    tokio::fs::create_dir_all(&config.data_dir).await?;

    let (events, _) = broadcast::channel(EVENT_CAPACITY);

    let products: FileStore<Product> =
        FileStore::new(&config.data_dir, "productos").with_events(events.clone());
    let carts: FileStore<Cart> =
        FileStore::new(&config.data_dir, "carrito").with_events(events.clone());

    let state = AppState::new(products, carts, events);
    let policy = Arc::new(StaticPolicy::new(config.admin));
    let router = app(state, policy, &config.public_dir);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, admin = config.admin, "listening");
    axum::serve(listener, router).await?;

    Ok(())
}
