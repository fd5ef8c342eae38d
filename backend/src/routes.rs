use std::sync::Arc;

use animalandia_common::product::{CatalogEntry, ProductInput, ProductPatch};
use animalandia_common::user::{LoginRequest, LoginUser, PublicUser, SignupRequest};
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::catalog::CatalogService;
use crate::error::{ServiceError, ServiceResult};
use crate::users::UserService;

pub struct AppState {
    pub catalog: CatalogService,
    pub users: UserService,
}

// ─── API types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ProductResponse {
    message: String,
    product: CatalogEntry,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct SignupResponse {
    message: String,
    user: PublicUser,
}

#[derive(Serialize)]
struct LoginResponse {
    message: String,
    user: LoginUser,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    products: usize,
    users: usize,
}

// ─── Blocking work ──────────────────────────────────────────────────────────

/// Run a service call on the blocking pool. The services read and rewrite
/// whole files and may wait on the write gate.
async fn run_blocking<T, F>(state: &Arc<AppState>, work: F) -> ServiceResult<T>
where
    F: FnOnce(&AppState) -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || work(&state)).await?
}

/// Decode an update body. An empty body is an empty patch.
fn patch_from_body(body: &[u8]) -> ServiceResult<ProductPatch> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ProductPatch::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ServiceError::Validation(format!("Invalid request body: {e}")))
}

// ─── Catalog Handlers ───────────────────────────────────────────────────────

async fn list_products_handler(
    State(state): State<Arc<AppState>>,
) -> ServiceResult<Json<Vec<CatalogEntry>>> {
    let entries = run_blocking(&state, |s| Ok(s.catalog.list())).await?;
    Ok(Json(entries))
}

async fn create_product_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ProductInput>, JsonRejection>,
) -> ServiceResult<(StatusCode, Json<ProductResponse>)> {
    let Json(input) = body?;
    let product = run_blocking(&state, move |s| s.catalog.create(input)).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            message: "Product created successfully".to_string(),
            product: product.into(),
        }),
    ))
}

async fn update_product_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> ServiceResult<Json<ProductResponse>> {
    let patch = patch_from_body(&body)?;
    let product = run_blocking(&state, move |s| s.catalog.update(&id, patch)).await?;
    Ok(Json(ProductResponse {
        message: "Product updated successfully".to_string(),
        product,
    }))
}

async fn delete_product_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ServiceResult<Json<MessageResponse>> {
    run_blocking(&state, move |s| s.catalog.delete(&id)).await?;
    Ok(Json(MessageResponse {
        message: "Product deleted successfully".to_string(),
    }))
}

// ─── Account Handlers ───────────────────────────────────────────────────────

async fn signup_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> ServiceResult<(StatusCode, Json<SignupResponse>)> {
    let Json(req) = body?;
    let user = run_blocking(&state, move |s| s.users.signup(req)).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Account created successfully".to_string(),
            user,
        }),
    ))
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ServiceResult<Json<LoginResponse>> {
    let Json(req) = body?;
    let user = run_blocking(&state, move |s| s.users.login(req)).await?;
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user,
    }))
}

// ─── Health ─────────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<Arc<AppState>>) -> ServiceResult<Json<HealthResponse>> {
    let (products, users) =
        run_blocking(&state, |s| Ok((s.catalog.list().len(), s.users.count()))).await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        products,
        users,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/catfood",
            get(list_products_handler).post(create_product_handler),
        )
        .route(
            "/api/catfood/{id}",
            put(update_product_handler).delete(delete_product_handler),
        )
        .route("/api/signup", post(signup_handler))
        .route("/api/login", post(login_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}
