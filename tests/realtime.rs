//! Publish-on-write: store mutations reach broadcast subscribers and
//! connected WebSocket clients.

mod common;

use common::*;
use futures_util::{SinkExt, StreamExt};
use http::Method;
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio::time::{Duration, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use tienda::realtime::Frame;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serves the app on an ephemeral port; the returned router shares
/// state with the served one, so requests through it are visible to
/// connected clients.
async fn serve_app() -> (SocketAddr, axum::Router, TestState) {
    let (router, state) = build_app(true);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let served = router.clone();
    tokio::spawn(async move {
        axum::serve(listener, served).await.unwrap();
    });

    (addr, router, state)
}

async fn connect(addr: SocketAddr) -> WsClient {
    let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws
}

async fn next_frame(ws: &mut WsClient) -> Frame {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .unwrap();

        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn product_mutations_reach_subscribers() {
    let (router, state) = build_app(true);
    let mut events = state.events.subscribe();

    request(&router, Method::POST, "/api/productos", Some(sample_product())).await;

    let event = events.recv().await.unwrap();
    assert_eq!(&*event.collection, "productos");
    assert_eq!(event.records.len(), 1);
    assert_eq!(event.records[0]["title"], "Yerba Mate");
}

#[tokio::test]
async fn cart_mutations_reach_subscribers() {
    let (router, state) = build_app(true);
    let mut events = state.events.subscribe();

    request(&router, Method::POST, "/api/carrito", None).await;

    let event = events.recv().await.unwrap();
    assert_eq!(&*event.collection, "carrito");
    assert_eq!(event.records.len(), 1);
}

#[tokio::test]
async fn every_mutation_carries_the_full_collection() {
    let (router, state) = build_app(true);
    let mut events = state.events.subscribe();

    request(&router, Method::POST, "/api/productos", Some(sample_product())).await;
    request(
        &router,
        Method::POST,
        "/api/productos",
        Some(json!({"title": "Bombilla", "price": 5.0})),
    )
    .await;

    let first = events.recv().await.unwrap();
    assert_eq!(first.records.len(), 1);

    let second = events.recv().await.unwrap();
    assert_eq!(second.records.len(), 2);
    assert_eq!(second.records[1]["title"], "Bombilla");
}

#[tokio::test]
async fn deletes_are_broadcast_too() {
    let (router, state) = build_app(true);

    request(&router, Method::POST, "/api/productos", Some(sample_product())).await;

    let mut events = state.events.subscribe();
    request(&router, Method::DELETE, "/api/productos/1", None).await;

    let event = events.recv().await.unwrap();
    assert_eq!(&*event.collection, "productos");
    assert!(event.records.is_empty());
}

#[tokio::test]
async fn new_client_receives_the_current_product_list() {
    let (addr, router, _state) = serve_app().await;

    request(&router, Method::POST, "/api/productos", Some(sample_product())).await;

    let mut ws = connect(addr).await;
    let frame = next_frame(&mut ws).await;
    assert_eq!(frame.event, "productos");

    let products = frame.data.as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["title"], "Yerba Mate");
}

#[tokio::test]
async fn store_mutations_are_forwarded_as_frames() {
    let (addr, router, _state) = serve_app().await;

    let mut ws = connect(addr).await;
    let initial = next_frame(&mut ws).await;
    assert_eq!(initial.event, "productos");
    assert_eq!(initial.data, json!([]));

    request(&router, Method::POST, "/api/productos", Some(sample_product())).await;

    let frame = next_frame(&mut ws).await;
    assert_eq!(frame.event, "productos");
    assert_eq!(frame.data.as_array().unwrap().len(), 1);
    assert_eq!(frame.data[0]["title"], "Yerba Mate");
}

#[tokio::test]
async fn client_events_trigger_a_rebroadcast_of_stored_state() {
    let (addr, _router, _state) = serve_app().await;

    let mut ws = connect(addr).await;
    let initial = next_frame(&mut ws).await;
    assert_eq!(initial.event, "productos");

    // The payload is never persisted; the rebroadcast carries the
    // collection as the store holds it, which is still empty.
    ws.send(Message::Text(
        r#"{"event":"new-carrito","data":{"timestamp":1}}"#.into(),
    ))
    .await
    .unwrap();

    let frame = next_frame(&mut ws).await;
    assert_eq!(frame.event, "carrito");
    assert_eq!(frame.data, json!([]));
}

#[tokio::test]
async fn malformed_client_frames_are_ignored() {
    let (addr, _router, _state) = serve_app().await;

    let mut ws = connect(addr).await;
    let initial = next_frame(&mut ws).await;
    assert_eq!(initial.event, "productos");

    ws.send(Message::Text("not json".into())).await.unwrap();
    ws.send(Message::Text(r#"{"sin":"evento"}"#.into()))
        .await
        .unwrap();
    ws.send(Message::Text(r#"{"event":"new-producto","data":{}}"#.into()))
        .await
        .unwrap();

    // The two bad frames produced nothing; the loop is still alive and
    // the valid event comes straight through.
    let frame = next_frame(&mut ws).await;
    assert_eq!(frame.event, "productos");
    assert_eq!(frame.data, json!([]));
}
