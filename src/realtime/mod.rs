//! The realtime channel: a WebSocket fan-out of store mutations.
//!
//! Frames in both directions are JSON objects `{"event": .., "data": ..}`.
//! The channel carries notifications only; the collection stores remain
//! the source of truth. Client-submitted `new-producto`/`new-carrito`
//! events are never persisted here, they just trigger a rebroadcast of
//! the named collection as the store currently holds it.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::app::AppState;
use crate::model::{Cart, Product};
use crate::store::{Collection, StoreEvent};

/// One frame on the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    pub data: Value,
}

impl Frame {
    fn from_event(event: &StoreEvent) -> Self {
        Self {
            event: event.collection.to_string(),
            data: Value::Array((*event.records).clone()),
        }
    }
}

pub async fn ws_handler<P, C>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<P, C>>,
) -> Response
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket<P, C>(mut socket: WebSocket, state: AppState<P, C>)
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    tracing::debug!("realtime client connected");

    // Subscribe before the initial read so no mutation slips between.
    let mut events = state.events.subscribe();

    // Every new client starts from the current product list.
    match state.products.get_all().await {
        Ok(products) => {
            let frame = Frame {
                event: "productos".to_string(),
                data: serde_json::to_value(products).unwrap_or_default(),
            };
            if send_frame(&mut socket, &frame).await.is_err() {
                return;
            }
        }
        Err(err) => {
            tracing::error!(err = %err, "failed to read products for new client");
        }
    }

    loop {
        let outgoing = tokio::select! {
            event = events.recv() => match event {
                Ok(event) => Some(Frame::from_event(&event)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // The next event carries the full collection anyway.
                    tracing::debug!(skipped, "realtime client lagged");
                    None
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = socket.recv() => match msg {
                Some(Ok(Message::Text(text))) => {
                    handle_client_frame(&state, text.as_str()).await;
                    None
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => None,
                Some(Err(err)) => {
                    tracing::debug!(err = %err, "realtime client errored");
                    break;
                }
            },
        };

        if let Some(frame) = outgoing {
            if send_frame(&mut socket, &frame).await.is_err() {
                break;
            }
        }
    }

    tracing::debug!("realtime client disconnected");
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), axum::Error> {
    let text = serde_json::to_string(frame).map_err(axum::Error::new)?;
    socket.send(Message::Text(text.into())).await
}

/// Client events are not a write path. Whatever payload the client
/// attached, the rebroadcast carries the collection as the store holds
/// it, so connected clients never see state that diverges from disk.
async fn handle_client_frame<P, C>(state: &AppState<P, C>, text: &str)
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    let frame: Frame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::debug!(err = %err, "ignoring malformed realtime frame");
            return;
        }
    };

    match frame.event.as_str() {
        "new-producto" => rebroadcast(state, "productos", state.products.get_all().await).await,
        "new-carrito" => rebroadcast(state, "carrito", state.carts.get_all().await).await,
        other => {
            tracing::debug!(event = other, "ignoring unknown realtime event");
        }
    }
}

async fn rebroadcast<P, C, R>(
    state: &AppState<P, C>,
    collection: &str,
    records: Result<Vec<R>, crate::store::Error>,
) where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
    R: crate::model::Record,
{
    let records = match records {
        Ok(records) => records,
        Err(err) => {
            tracing::error!(err = %err, collection, "failed to read collection for rebroadcast");
            return;
        }
    };

    let values: Vec<Value> = records
        .iter()
        .filter_map(|r| serde_json::to_value(r).ok())
        .collect();

    let _ = state.events.send(StoreEvent {
        collection: Arc::from(collection),
        records: Arc::new(values),
    });
}
