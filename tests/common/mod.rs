use axum::Router;
use axum::body::Body;
use http::header::CONTENT_TYPE;
use http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower::ServiceExt;

use tienda::app::{AppState, EVENT_CAPACITY, app};
use tienda::gate::StaticPolicy;
use tienda::model::{Cart, Product};
use tienda::store::MemoryStore;

pub type TestState = AppState<MemoryStore<Product>, MemoryStore<Cart>>;

pub fn build_state() -> TestState {
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    let products = MemoryStore::new("productos").with_events(events.clone());
    let carts = MemoryStore::new("carrito").with_events(events.clone());

    AppState::new(products, carts, events)
}

pub fn build_app(admin: bool) -> (Router, TestState) {
    let state = build_state();
    let router = app(state.clone(), Arc::new(StaticPolicy::new(admin)), "public");

    (router, state)
}

pub fn sample_product() -> Value {
    json!({
        "title": "Yerba Mate",
        "price": 10.0,
        "thumbnail": "https://example.com/mate.png"
    })
}

pub async fn request(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}
