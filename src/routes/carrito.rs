//! The cart resource: carts hold snapshots of products, copied in at
//! the time of addition and never revalidated against the live product
//! collection. No admin gate here, matching the documented surface.
//!
//! Cart contents are edited read-modify-write in the handlers: the
//! store serializes the writes themselves, so the backing file never
//! tears, but two concurrent edits of the same cart resolve
//! last-write-wins.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use http::StatusCode;
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::model::{Cart, Product, deserialize_id};
use crate::routes::parse_id;
use crate::store::Collection;

/// Body of `POST /carrito/{id}/productos`: a reference to an existing
/// product, id sent as a number or numeric string.
#[derive(Debug, Deserialize)]
struct ProductRef {
    #[serde(deserialize_with = "deserialize_id")]
    id: u64,
}

pub fn router<P, C>() -> Router<AppState<P, C>>
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    Router::new()
        .route(
            "/carrito",
            post(create::<P, C>).get(list::<P, C>).delete(clear::<P, C>),
        )
        .route(
            "/carrito/{id}",
            get(get_one::<P, C>).delete(remove::<P, C>),
        )
        .route(
            "/carrito/{id}/productos",
            get(list_products::<P, C>).post(add_product::<P, C>),
        )
        .route(
            "/carrito/{id}/productos/{id_prod}",
            delete(remove_product::<P, C>),
        )
}

async fn create<P, C>(State(state): State<AppState<P, C>>) -> Result<Json<Cart>, ApiError>
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    let saved = state.carts.save(Cart::empty()).await?;
    Ok(Json(saved))
}

async fn list<P, C>(State(state): State<AppState<P, C>>) -> Result<Json<Vec<Cart>>, ApiError>
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    Ok(Json(state.carts.get_all().await?))
}

async fn get_one<P, C>(
    State(state): State<AppState<P, C>>,
    Path(id): Path<String>,
) -> Result<Json<Cart>, ApiError>
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    let id = parse_id(&id)?;
    let cart = fetch_cart(&state, id).await?;

    Ok(Json(cart))
}

async fn remove<P, C>(
    State(state): State<AppState<P, C>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Cart>>, ApiError>
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    let id = parse_id(&id)?;
    fetch_cart(&state, id).await?;
    state.carts.delete_by_id(id).await?;

    Ok(Json(state.carts.get_all().await?))
}

async fn clear<P, C>(State(state): State<AppState<P, C>>) -> Result<StatusCode, ApiError>
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    state.carts.delete_all().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_products<P, C>(
    State(state): State<AppState<P, C>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Product>>, ApiError>
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    let id = parse_id(&id)?;
    let cart = fetch_cart(&state, id).await?;

    Ok(Json(cart.products))
}

async fn add_product<P, C>(
    State(state): State<AppState<P, C>>,
    Path(id): Path<String>,
    Json(product_ref): Json<ProductRef>,
) -> Result<Json<Cart>, ApiError>
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    let id = parse_id(&id)?;

    let product = state
        .products
        .get_by_id(product_ref.id)
        .await?
        .ok_or(ApiError::not_found("producto", product_ref.id))?;

    let mut cart = fetch_cart(&state, id).await?;
    cart.products.push(product);
    let updated = state.carts.update(cart, id).await?;

    Ok(Json(updated))
}

async fn remove_product<P, C>(
    State(state): State<AppState<P, C>>,
    Path((id, id_prod)): Path<(String, String)>,
) -> Result<Json<Cart>, ApiError>
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    let id = parse_id(&id)?;
    let id_prod = parse_id(&id_prod)?;

    let mut cart = fetch_cart(&state, id).await?;
    cart.products.retain(|p| p.id != Some(id_prod));
    let updated = state.carts.update(cart, id).await?;

    Ok(Json(updated))
}

async fn fetch_cart<P, C>(state: &AppState<P, C>, id: u64) -> Result<Cart, ApiError>
where
    P: Collection<Record = Product>,
    C: Collection<Record = Cart>,
{
    state
        .carts
        .get_by_id(id)
        .await?
        .ok_or(ApiError::not_found("carrito", id))
}
