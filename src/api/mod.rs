//! HTTP surface: axum router, request extraction, error mapping.

use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::domain::product::{Brand, Category, Product};
use crate::error::Error;
use crate::service::basket::{AddItemOutcome, AddItemRequest, BasketView};
use crate::service::product::{
    CreateProduct, Page, PageParams, ProductFilter, UpdateProduct,
};
use crate::service::{BasketService, ProductService};
use crate::store::PgBasketStore;

#[derive(Clone)]
pub struct AppState {
    pub products: ProductService,
    pub basket: BasketService<PgBasketStore, ProductService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/products", get(list_products).post(create_product))
        .route("/api/v1/products/paginated", get(paginated_products))
        .route("/api/v1/products/filter", post(filter_products))
        .route(
            "/api/v1/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/v1/categories", get(list_categories))
        .route("/api/v1/categories/:id/products", get(products_by_category))
        .route("/api/v1/brands", get(list_brands))
        .route("/api/v1/basket", get(get_basket))
        .route(
            "/api/v1/basket/items/:id",
            post(add_basket_item).delete(remove_basket_item),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Caller identity, resolved per request from the `x-user-id` header.
/// The operation fails outright when it is missing or malformed.
pub struct UserId(pub Uuid);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .map(UserId)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "message": "missing or invalid x-user-id header" })),
                )
                    .into_response()
            })
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::ProductNotFound
            | Error::BasketNotFound
            | Error::BasketItemNotFound
            | Error::CategoryNotFound
            | Error::BrandNotFound
            | Error::NoMatchingProducts
            | Error::InvalidColor(_)
            | Error::InvalidSize(_) => StatusCode::NOT_FOUND,
            Error::SlugTaken(_) => StatusCode::CONFLICT,
            Error::InvalidQuantity | Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Inconsistent(_) | Error::Storage(_) => {
                tracing::error!(error = %self, "internal failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": "boutique" }))
}

async fn list_products(State(s): State<AppState>) -> Result<Json<Vec<Product>>, Error> {
    s.products.list().await.map(Json)
}

async fn paginated_products(
    State(s): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Product>>, Error> {
    s.products.page(params).await.map(Json)
}

async fn filter_products(
    State(s): State<AppState>,
    Json(filter): Json<ProductFilter>,
) -> Result<Json<Vec<Product>>, Error> {
    s.products.filter(filter).await.map(Json)
}

async fn get_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, Error> {
    s.products.get(id).await.map(Json)
}

async fn create_product(
    State(s): State<AppState>,
    Json(params): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>), Error> {
    let product = s.products.create(params).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(params): Json<UpdateProduct>,
) -> Result<Json<Product>, Error> {
    s.products.update(id, params).await.map(Json)
}

async fn delete_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, Error> {
    s.products.delete(id).await?;
    Ok(Json(json!({ "message": "Product deleted successfully!" })))
}

async fn list_categories(
    State(s): State<AppState>,
) -> Result<Json<Vec<Category>>, Error> {
    s.products.categories().await.map(Json)
}

async fn products_by_category(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Product>>, Error> {
    s.products.by_category(id).await.map(Json)
}

async fn list_brands(
    State(s): State<AppState>,
) -> Result<Json<Vec<Brand>>, Error> {
    s.products.brands().await.map(Json)
}

async fn get_basket(
    State(s): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<BasketView>, Error> {
    s.basket.get_basket(user_id).await.map(Json)
}

async fn add_basket_item(
    State(s): State<AppState>,
    UserId(user_id): UserId,
    Path(product_id): Path<Uuid>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<AddItemOutcome>, Error> {
    s.basket.add_item(user_id, product_id, req).await.map(Json)
}

async fn remove_basket_item(
    State(s): State<AppState>,
    UserId(user_id): UserId,
    Path(item_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, Error> {
    s.basket.remove_item(user_id, item_id).await?;
    Ok(Json(json!({ "message": "Product successfully deleted from basket!" })))
}
