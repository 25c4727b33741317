//! Product API endpoints.
//!
//! - POST `/` - Create a product (auth required)
//! - GET `/{uuid}` - Fetch a product (public)
//! - PUT `/{uuid}` - Update a product (owner only)
//! - DELETE `/{uuid}` - Delete a product (owner only)

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_uuid};
use crate::auth::Auth;
use crate::db::{Database, Product};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

#[derive(Clone)]
pub struct ProductsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(ProductsState);

pub fn router(state: ProductsState) -> Router {
    Router::new()
        .route("/", post(create_product))
        .route(
            "/{uuid}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_state(state)
}

#[derive(Deserialize)]
struct ProductRequest {
    title: String,
    #[serde(default)]
    description: String,
    price: f64,
    #[serde(default)]
    image: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductResponse {
    id: String,
    user: String,
    title: String,
    description: String,
    price: f64,
    image: String,
    created_at: String,
    updated_at: String,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.uuid,
            user: product.user_uuid,
            title: product.title,
            description: product.description,
            price: product.price,
            image: product.image,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

fn validate_product(payload: &ProductRequest) -> Result<(), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }
    if !payload.price.is_finite() || payload.price < 0.0 {
        return Err(ApiError::bad_request("Price must be a non-negative number"));
    }
    Ok(())
}

async fn create_product(
    State(state): State<ProductsState>,
    Auth(user): Auth,
    Json(payload): Json<ProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_product(&payload)?;

    let uuid = uuid::Uuid::new_v4().to_string();
    let product = state
        .db
        .products()
        .create(
            &uuid,
            &user.claims.sub,
            payload.title.trim(),
            &payload.description,
            payload.price,
            &payload.image,
        )
        .await
        .db_err("Failed to create product")?;

    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

async fn get_product(
    State(state): State<ProductsState>,
    Path(uuid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;

    let product = state
        .db
        .products()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get product")?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    Ok(Json(ProductResponse::from(product)))
}

async fn update_product(
    State(state): State<ProductsState>,
    Auth(user): Auth,
    Path(uuid): Path<String>,
    Json(payload): Json<ProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;
    validate_product(&payload)?;

    let product = state
        .db
        .products()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get product")?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    if product.user_uuid != user.claims.sub {
        return Err(ApiError::forbidden("You can only update your own products"));
    }

    state
        .db
        .products()
        .update(
            &uuid,
            payload.title.trim(),
            &payload.description,
            payload.price,
            &payload.image,
        )
        .await
        .db_err("Failed to update product")?;

    let product = state
        .db
        .products()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to load updated product")?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    Ok(Json(ProductResponse::from(product)))
}

async fn delete_product(
    State(state): State<ProductsState>,
    Auth(user): Auth,
    Path(uuid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;

    let product = state
        .db
        .products()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get product")?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    if product.user_uuid != user.claims.sub {
        return Err(ApiError::forbidden("You can only delete your own products"));
    }

    state
        .db
        .products()
        .delete(&uuid)
        .await
        .db_err("Failed to delete product")?;

    Ok(StatusCode::NO_CONTENT)
}
