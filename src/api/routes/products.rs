//! Product and service catalog endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;

use crate::api::{
    error::ApiError,
    extractors::{ADMIN, AuthUser, BACK_OFFICE},
    server::AppState,
};
use crate::core::product::{self, NewProduct, ProductUpdate};
use crate::entities::{ProductKind, ProductModel};
use crate::errors::Error;

/// Query parameters for listing the catalog
#[derive(Debug, Default, Deserialize)]
struct ProductQuery {
    kind: Option<ProductKind>,
}

/// GET /api/products
async fn list_products(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductModel>>, ApiError> {
    auth.require_role(BACK_OFFICE)?;
    Ok(Json(
        product::get_all_active_products(&state.db, query.kind).await?,
    ))
}

/// POST /api/products
async fn create_product(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<ProductModel>), ApiError> {
    auth.require_role(ADMIN)?;
    let created = product::create_product(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/products/{id}
async fn get_product(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ProductModel>, ApiError> {
    auth.require_role(BACK_OFFICE)?;
    let found = product::get_product_by_id(&state.db, id)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| Error::not_found("product", id))?;
    Ok(Json(found))
}

/// PUT /api/products/{id}
async fn update_product(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<ProductUpdate>,
) -> Result<Json<ProductModel>, ApiError> {
    auth.require_role(ADMIN)?;
    Ok(Json(product::update_product(&state.db, id, req).await?))
}

/// DELETE /api/products/{id} - soft delete
async fn delete_product(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    auth.require_role(ADMIN)?;
    product::delete_product(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Product routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[cfg(test)]
mod tests {
    use crate::entities::Role;
    use crate::test_utils::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_admin_manages_catalog() -> crate::errors::Result<()> {
        let state = setup_test_state().await?;
        let token = login_as(&state, "admin@example.test", Role::Admin, None, None).await?;
        let app = crate::api::router(state);

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/api/products",
            Some(&token),
            Some(json!({ "name": "Laptop stand", "price": 49.5, "kind": "product" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_i64().unwrap_or_default();

        let (status, body) = send(
            app.clone(),
            Method::PUT,
            &format!("/api/products/{id}"),
            Some(&token),
            Some(json!({ "price": 45.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"], 45.0);

        let (status, body) =
            send(app.clone(), Method::GET, "/api/products?kind=service", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(0));

        let (status, _) = send(
            app.clone(),
            Method::DELETE,
            &format!("/api/products/{id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) =
            send(app, Method::GET, &format!("/api/products/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        Ok(())
    }

    #[tokio::test]
    async fn test_staff_reads_but_cannot_write() -> crate::errors::Result<()> {
        let state = setup_test_state().await?;
        create_test_product(&state.db, "Consulting").await?;
        let staff = create_test_staff(&state.db, "Sam Staff").await?;
        let token =
            login_as(&state, "sam@example.test", Role::Staff, None, Some(staff.id)).await?;
        let app = crate::api::router(state);

        let (status, body) = send(app.clone(), Method::GET, "/api/products", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));

        let (status, _) = send(
            app,
            Method::POST,
            "/api/products",
            Some(&token),
            Some(json!({ "name": "Sneaky", "price": 1.0, "kind": "service" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        Ok(())
    }
}
