//! The product resource: CRUD over the `productos` collection, every
//! route behind the admin gate.
//!
//! The historical surface left `DELETE /productos/{id}` ungated; that
//! was an oversight and the whole resource now sits behind one gate.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

use crate::app::AppState;
use crate::error::ApiError;
use crate::gate::{AdminGateLayer, AdminPolicy};
use crate::model::{Cart, Product, now_millis};
use crate::routes::parse_id;
use crate::store::Collection;

pub fn router<P, C>(policy: Arc<dyn AdminPolicy>) -> Router<AppState<P, C>>
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    Router::new()
        .route("/productos", get(list::<P, C>).post(create::<P, C>))
        .route(
            "/productos/{id}",
            get(get_one::<P, C>)
                .put(replace::<P, C>)
                .delete(remove::<P, C>),
        )
        .layer(AdminGateLayer::new(policy))
}

async fn list<P, C>(State(state): State<AppState<P, C>>) -> Result<Json<Vec<Product>>, ApiError>
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    Ok(Json(state.products.get_all().await?))
}

async fn get_one<P, C>(
    State(state): State<AppState<P, C>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError>
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    let id = parse_id(&id)?;
    let product = state
        .products
        .get_by_id(id)
        .await?
        .ok_or(ApiError::not_found("producto", id))?;

    Ok(Json(product))
}

async fn create<P, C>(
    State(state): State<AppState<P, C>>,
    Json(mut product): Json<Product>,
) -> Result<Json<Product>, ApiError>
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    product.timestamp = Some(now_millis());
    let saved = state.products.save(product).await?;

    Ok(Json(saved))
}

/// Full replace of the stored fields; responds with the updated
/// collection, as the surface always has.
async fn replace<P, C>(
    State(state): State<AppState<P, C>>,
    Path(id): Path<String>,
    Json(product): Json<Product>,
) -> Result<Json<Vec<Product>>, ApiError>
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    let id = parse_id(&id)?;
    state.products.update(product, id).await?;

    Ok(Json(state.products.get_all().await?))
}

async fn remove<P, C>(
    State(state): State<AppState<P, C>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Product>>, ApiError>
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    let id = parse_id(&id)?;
    state
        .products
        .get_by_id(id)
        .await?
        .ok_or(ApiError::not_found("producto", id))?;
    state.products.delete_by_id(id).await?;

    Ok(Json(state.products.get_all().await?))
}
