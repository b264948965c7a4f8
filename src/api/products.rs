//! Catalog endpoints: product listing/CRUD, reviews, top rated, stats

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router, middleware};
use serde::{Deserialize, Serialize};

use crate::auth::UserIdentity;
use crate::auth::user_auth::{auth_middleware, require_admin};
use crate::db;
use crate::db::products::{Product, ProductFilters, ProductInput};
use crate::error::{AppError, ErrorCode};
use crate::state::AppState;
use crate::util::{now_millis, positive_param, total_pages};

use super::{ApiResult, internal};

const DEFAULT_PAGE_SIZE: i64 = 32;
const MAX_PAGE_SIZE: i64 = 100;
const TOP_PRODUCTS: i64 = 3;

pub fn router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_products))
        .route("/top", get(top_products))
        .route("/{id}", get(get_product))
        .route("/{id}/reviews", get(list_reviews));

    let authed = Router::new()
        .route("/{id}/reviews", post(create_review))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin = Router::new()
        .route("/", post(create_product).delete(delete_all_products))
        .route("/stats", get(product_stats))
        .route("/{id}", put(update_product).delete(delete_product))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().nest("/api/products", public.merge(authed).merge(admin))
}

/// Reject inputs the storage constraints would also reject, with a
/// caller-fixable message instead of a constraint trip.
fn validate_product(input: &ProductInput) -> Result<(), AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    if input.price < 0.0 {
        return Err(AppError::new(ErrorCode::ProductInvalidPrice));
    }
    if input.brand.trim().is_empty() {
        return Err(AppError::validation("Brand is required"));
    }
    if input.category.trim().is_empty() {
        return Err(AppError::validation("Category is required"));
    }
    if input.count_in_stock < 0 {
        return Err(AppError::validation("Stock must be non-negative"));
    }
    match (input.on_sale, input.sale_price) {
        (true, None) => {
            return Err(AppError::validation("Sale price is required when on sale"));
        }
        (true, Some(sale)) if sale < 0.0 || sale >= input.price => {
            return Err(AppError::validation(
                "Sale price must be below the regular price",
            ));
        }
        (false, Some(_)) => {
            return Err(AppError::validation(
                "Sale price must be absent when not on sale",
            ));
        }
        _ => {}
    }
    Ok(())
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub gender: Option<String>,
    pub featured: Option<bool>,
    // Kept as strings so a non-numeric value falls back to the default
    // instead of failing extraction
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub page: i64,
    pub pages: i64,
    pub total: i64,
}

/// GET /api/products?keyword=&category=&gender=&featured=&page=&limit=
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<ProductPage> {
    let per_page =
        positive_param(query.limit.as_deref(), DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let page = positive_param(query.page.as_deref(), 1);
    let offset = (page - 1) * per_page;

    let filters = ProductFilters {
        keyword: query.keyword.filter(|k| !k.is_empty()),
        category: query.category.filter(|c| !c.is_empty()),
        gender: query.gender.filter(|g| !g.is_empty()),
        featured: query.featured,
    };

    let total = db::products::count(&state.pool, &filters)
        .await
        .map_err(internal)?;
    let products = db::products::list(&state.pool, &filters, per_page, offset)
        .await
        .map_err(internal)?;

    Ok(Json(ProductPage {
        products,
        page,
        pages: total_pages(total, per_page),
        total,
    }))
}

/// GET /api/products/top
pub async fn top_products(State(state): State<AppState>) -> ApiResult<Vec<Product>> {
    let products = db::products::top_rated(&state.pool, TOP_PRODUCTS)
        .await
        .map_err(internal)?;
    Ok(Json(products))
}

/// GET /api/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Product> {
    let product = db::products::find_by_id(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    Ok(Json(product))
}

/// POST /api/products (admin)
pub async fn create_product(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Product> {
    validate_product(&input)?;

    let product = db::products::create(&state.pool, identity.user_id, &input, now_millis())
        .await
        .map_err(internal)?;

    tracing::info!(product_id = product.id, "Product created");
    Ok(Json(product))
}

/// PUT /api/products/{id} (admin)
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Product> {
    validate_product(&input)?;

    let product = db::products::update(&state.pool, id, &input, now_millis())
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    Ok(Json(product))
}

/// DELETE /api/products/{id} (admin)
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let deleted = db::products::delete(&state.pool, id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(AppError::new(ErrorCode::ProductNotFound));
    }
    Ok(Json(serde_json::json!({ "message": "Product removed" })))
}

/// DELETE /api/products (admin)
pub async fn delete_all_products(
    State(state): State<AppState>,
) -> ApiResult<serde_json::Value> {
    let removed = db::products::delete_all(&state.pool)
        .await
        .map_err(internal)?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}

#[derive(Serialize)]
pub struct ProductStats {
    pub total_products: i64,
    pub out_of_stock: i64,
    pub low_stock: i64,
    pub categories: Vec<db::products::CategoryCount>,
}

/// GET /api/products/stats (admin)
pub async fn product_stats(State(state): State<AppState>) -> ApiResult<ProductStats> {
    let total_products = db::products::count_total(&state.pool)
        .await
        .map_err(internal)?;
    let out_of_stock = db::products::count_out_of_stock(&state.pool)
        .await
        .map_err(internal)?;
    let low_stock = db::products::count_low_stock(&state.pool)
        .await
        .map_err(internal)?;
    let categories = db::products::counts_by_category(&state.pool)
        .await
        .map_err(internal)?;

    Ok(Json(ProductStats {
        total_products,
        out_of_stock,
        low_stock,
        categories,
    }))
}

/// GET /api/products/{id}/reviews
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<db::reviews::Review>> {
    db::products::find_by_id(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;

    let reviews = db::reviews::list_for_product(&state.pool, id)
        .await
        .map_err(internal)?;
    Ok(Json(reviews))
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub rating: i32,
    pub comment: String,
}

/// POST /api/products/{id}/reviews
pub async fn create_review(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
    Json(req): Json<ReviewRequest>,
) -> ApiResult<serde_json::Value> {
    if !(1..=5).contains(&req.rating) {
        return Err(AppError::new(ErrorCode::ReviewRatingInvalid));
    }
    if req.comment.trim().is_empty() {
        return Err(AppError::validation("Comment is required"));
    }

    db::products::find_by_id(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;

    match db::reviews::create_and_refresh_rating(
        &state.pool,
        id,
        identity.user_id,
        req.rating,
        req.comment.trim(),
        now_millis(),
    )
    .await
    {
        Ok(_) => {}
        Err(e) if db::is_unique_violation(&e) => {
            return Err(AppError::new(ErrorCode::ProductAlreadyReviewed));
        }
        Err(e) => return Err(internal(e)),
    }

    Ok(Json(serde_json::json!({ "message": "Review added" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> ProductInput {
        ProductInput {
            name: "Trail Runner".into(),
            price: 89.0,
            brand: "Reef".into(),
            category: "shoes".into(),
            count_in_stock: 12,
            image: None,
            description: None,
            featured: false,
            size: None,
            color: None,
            gender: None,
            on_sale: false,
            sale_price: None,
        }
    }

    #[test]
    fn test_valid_product_passes() {
        assert!(validate_product(&base_input()).is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut input = base_input();
        input.name = "  ".into();
        assert!(validate_product(&input).is_err());
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut input = base_input();
        input.price = -1.0;
        let err = validate_product(&input).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductInvalidPrice);
    }

    #[test]
    fn test_sale_price_rules() {
        let mut input = base_input();
        input.on_sale = true;
        input.sale_price = None;
        assert!(validate_product(&input).is_err());

        input.sale_price = Some(100.0); // above regular price
        assert!(validate_product(&input).is_err());

        input.sale_price = Some(59.0);
        assert!(validate_product(&input).is_ok());

        input.on_sale = false;
        assert!(validate_product(&input).is_err());
    }
}
