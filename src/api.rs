//! HTTP surface for the item registry.
//!
//! This module exposes a compact Axum router with the CRUD endpoints:
//!
//! - `GET /` – Welcome message confirming the service is up.
//! - `GET /items` – List every stored item, in insertion order.
//! - `POST /items` – Validate and store a new item (201 on success).
//! - `GET /items/{id}` – Fetch a single item (404 when absent).
//! - `PUT /items/{id}` – Merge a partial update into a stored item.
//! - `DELETE /items/{id}` – Remove an item (204, empty body).
//!
//! Errors surface as JSON: field validation failures as 422 with one entry
//! per violated field, unknown identifiers as 404 naming the id, and
//! anything unanticipated as a generic 500 carrying only a textual summary.

use crate::registry::{FieldViolation, Item, ItemPatch, NewItem, RegistryApi, RegistryError};
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the HTTP router exposing the registry API surface.
pub fn create_router<S>(registry: Arc<S>) -> Router
where
    S: RegistryApi + 'static,
{
    Router::new()
        .route("/", get(root))
        .route("/items", get(list_items::<S>).post(create_item::<S>))
        .route(
            "/items/:id",
            get(get_item::<S>)
                .put(update_item::<S>)
                .delete(delete_item::<S>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

/// Wide-open CORS policy: any origin, method, and header, with credentials.
///
/// The layer mirrors the request origin, which is the only way to combine
/// credentials with arbitrary origins. Suitable for a demonstration
/// deployment only, so it is attached separately and gated by the
/// `PERMISSIVE_CORS` configuration rather than baked into the router.
pub fn permissive_cors_layer() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Response body for the root endpoint.
#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
}

/// Confirm the service is running.
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Welcome to the item registry!",
    })
}

/// Request body for `POST /items`.
#[derive(Deserialize)]
struct CreateItemRequest {
    /// Item name, 1 to 100 characters.
    name: String,
    /// Optional free-form description.
    #[serde(default)]
    description: Option<String>,
    /// Strictly positive price.
    price: f64,
    /// Optional non-negative tax amount.
    #[serde(default)]
    tax: Option<f64>,
    /// Tags stored verbatim; defaults to empty.
    #[serde(default)]
    tags: Vec<String>,
}

impl CreateItemRequest {
    fn into_input(self) -> NewItem {
        NewItem {
            name: self.name,
            description: self.description,
            price: self.price,
            tax: self.tax,
            tags: self.tags,
        }
    }
}

/// Request body for `PUT /items/{id}`; every field is optional.
///
/// Absent fields leave the stored value untouched. An explicit `null`
/// clears the nullable fields (`description`, `tax`); for the required
/// fields a `null` is treated as absent so a stored item can never end up
/// violating its own schema.
#[derive(Deserialize)]
struct UpdateItemRequest {
    /// Replacement name.
    #[serde(default)]
    name: Option<String>,
    /// Replacement description; `null` clears it.
    #[serde(default, deserialize_with = "present_or_null")]
    description: Option<Option<String>>,
    /// Replacement price.
    #[serde(default)]
    price: Option<f64>,
    /// Replacement tax; `null` clears it.
    #[serde(default, deserialize_with = "present_or_null")]
    tax: Option<Option<f64>>,
    /// Replacement tag list.
    #[serde(default)]
    tags: Option<Vec<String>>,
}

impl UpdateItemRequest {
    fn into_patch(self) -> ItemPatch {
        ItemPatch {
            name: self.name,
            description: self.description,
            price: self.price,
            tax: self.tax,
            tags: self.tags,
        }
    }
}

/// Distinguish an explicitly supplied `null` from an absent field.
fn present_or_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// List every item currently held by the registry.
async fn list_items<S>(State(registry): State<Arc<S>>) -> Result<Json<Vec<Item>>, AppError>
where
    S: RegistryApi,
{
    let items = registry.list_items().await?;
    Ok(Json(items))
}

/// Fetch a single item by identifier.
async fn get_item<S>(
    State(registry): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<Item>, AppError>
where
    S: RegistryApi,
{
    let item = registry.get_item(&id).await?;
    Ok(Json(item))
}

/// Validate and store a new item.
async fn create_item<S>(
    State(registry): State<Arc<S>>,
    payload: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), AppError>
where
    S: RegistryApi,
{
    let Json(request) = payload.map_err(reject_body)?;
    let item = registry.create_item(request.into_input()).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Merge a partial update into a stored item.
async fn update_item<S>(
    State(registry): State<Arc<S>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Json<Item>, AppError>
where
    S: RegistryApi,
{
    let Json(request) = payload.map_err(reject_body)?;
    let item = registry.update_item(&id, request.into_patch()).await?;
    Ok(Json(item))
}

/// Remove an item by identifier.
async fn delete_item<S>(
    State(registry): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError>
where
    S: RegistryApi,
{
    registry.delete_item(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fold a body deserialization failure into the validation error shape.
///
/// Unparseable JSON, missing required fields, and type mismatches all
/// surface as 422 with the same structure as field-level violations.
fn reject_body(rejection: JsonRejection) -> AppError {
    AppError::from(RegistryError::Validation(vec![FieldViolation {
        field: "body",
        message: rejection.body_text(),
    }]))
}

/// Boundary error translating domain failures into HTTP responses.
struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(error) = self.0.downcast_ref::<RegistryError>() {
            return match error {
                RegistryError::NotFound { .. } => (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "detail": error.to_string() })),
                )
                    .into_response(),
                RegistryError::Validation(violations) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({
                        "detail": "Validation error",
                        "errors": violations,
                    })),
                )
                    .into_response(),
            };
        }
        // Catch-all: report a textual summary only, never a backtrace.
        tracing::error!(error = %self.0, "Unhandled error while serving a request");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "detail": "An internal server error occurred",
                "error": self.0.to_string(),
            })),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(inner: E) -> Self {
        Self(inner.into())
    }
}
