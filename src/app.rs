//! Router composition: the `/api` resources, the realtime channel and
//! the static asset directory behind one router.

use axum::routing::get;
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::gate::AdminPolicy;
use crate::model::{Cart, Product};
use crate::realtime;
use crate::routes;
use crate::store::{Collection, StoreEvent};

/// Capacity of the store-event broadcast channel. Slow realtime
/// clients skip intermediate events; each event carries the full
/// collection, so nothing is missed for long.
pub const EVENT_CAPACITY: usize = 32;

/// Shared state: one store per collection plus the change-event hub
/// both stores publish into.
#[derive(Debug)]
pub struct AppState<P, C> {
    pub products: P,
    pub carts: C,
    pub events: broadcast::Sender<StoreEvent>,
}

impl<P: Clone, C: Clone> Clone for AppState<P, C> {
    fn clone(&self) -> Self {
        Self {
            products: self.products.clone(),
            carts: self.carts.clone(),
            events: self.events.clone(),
        }
    }
}

impl<P, C> AppState<P, C>
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    pub fn new(products: P, carts: C, events: broadcast::Sender<StoreEvent>) -> Self {
        Self {
            products,
            carts,
            events,
        }
    }
}

/// Builds the application router.
///
/// The admin policy is handed in here rather than read from global
/// state, so callers (and tests) decide who counts as admin.
pub fn app<P, C>(
    state: AppState<P, C>,
    policy: Arc<dyn AdminPolicy>,
    public_dir: impl AsRef<Path>,
) -> Router
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    let api = Router::new()
        .merge(routes::productos::router(policy))
        .merge(routes::carrito::router());

    Router::new()
        .nest("/api", api)
        .route("/ws", get(realtime::ws_handler::<P, C>))
        .fallback_service(ServeDir::new(public_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
