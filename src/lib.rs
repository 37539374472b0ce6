//! # Tienda: a file-backed products-and-carts API
//!
//! `tienda` is a small e-commerce backend: REST resources for products
//! and shopping carts persisted as flat JSON files, with a WebSocket
//! channel broadcasting every collection change to connected clients.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tienda::app::{app, AppState, EVENT_CAPACITY};
//! use tienda::gate::StaticPolicy;
//! use tienda::model::{Cart, Product};
//! use tienda::store::FileStore;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (events, _) = broadcast::channel(EVENT_CAPACITY);
//!
//!     let products: FileStore<Product> =
//!         FileStore::new("data", "productos").with_events(events.clone());
//!     let carts: FileStore<Cart> =
//!         FileStore::new("data", "carrito").with_events(events.clone());
//!
//!     let state = AppState::new(products, carts, events);
//!     let router = app(state, Arc::new(StaticPolicy::new(true)), "public");
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```
//!
//! # Stores
//!
//! Two [`store::Collection`] backends ship with the crate:
//!
//! - [`store::FileStore`] persists a collection as a JSON array on
//!   disk. Mutations are serialized per collection and written via a
//!   temp-file rename, so concurrent writers cannot lose updates and a
//!   crash cannot leave a torn file.
//! - [`store::MemoryStore`] keeps the collection in memory. For tests
//!   and local development only.
//!
//! Both publish a [`store::StoreEvent`] with the full collection after
//! every successful mutation; the realtime channel is a subscriber of
//! those events, never an independent source of state.
//!
//! # Admin gate
//!
//! Mutating product routes sit behind [`gate::AdminGateLayer`], a tower
//! middleware holding an [`gate::AdminPolicy`]. The shipped policy is
//! [`gate::StaticPolicy`]: one process-wide boolean, no per-user
//! identity. Denied requests get a `403` with the historical body
//! `{"error": -1, "descripcion": "no autorizado"}`.

pub mod app;
pub mod config;
pub mod error;
pub mod gate;
pub mod model;
pub mod realtime;
pub mod routes;
pub mod store;

pub use config::Config;
pub use error::ApiError;
