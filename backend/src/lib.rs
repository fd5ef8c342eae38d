//! Animalandia backend.
//!
//! Serves the product catalog and account endpoints used by the storefront
//! and admin dashboard. Both collections live in JSON files and every
//! mutation rewrites its file in full.

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod store;
pub mod users;
pub mod write_gate;

use std::sync::Arc;

use animalandia_common::product::CatalogEntry;
use animalandia_common::user::User;
use axum::Router;
use tracing::{error, info};

use crate::catalog::CatalogService;
use crate::config::BackendConfig;
use crate::error::ServiceResult;
use crate::routes::AppState;
use crate::store::JsonFileStore;
use crate::users::UserService;

/// Build the services over the configured files and seed the admin account.
///
/// A users file that cannot be read or written does not stop startup: the
/// failure is logged, the file is left alone and the catalog still serves.
pub fn build_state(config: &BackendConfig) -> ServiceResult<Arc<AppState>> {
    let catalog = CatalogService::new(
        Box::new(JsonFileStore::<CatalogEntry>::new(&config.products_path)),
        config.write_mode,
    );
    let users = UserService::new(
        Box::new(JsonFileStore::<User>::new(&config.users_path)),
        config.write_mode,
        &config.admin,
    );
    match users.ensure_admin(&config.admin) {
        Ok(true) => {}
        Ok(false) => info!(email = %config.admin.email, "Admin account already present"),
        Err(e) => error!("Failed to seed admin account: {e}"),
    }
    Ok(Arc::new(AppState { catalog, users }))
}

/// The full HTTP application for `config`.
pub fn app(config: &BackendConfig) -> ServiceResult<Router> {
    Ok(routes::router(build_state(config)?))
}
