mod packages;
mod settings;

pub use packages::*;
pub use settings::*;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get},
    Router,
};

use crate::db::AppState;
use crate::middleware::admin_auth;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/settings", get(list_settings).put(upsert_setting))
        .route("/admin/settings/{key}", delete(delete_setting))
        .route("/admin/packages", get(list_packages).put(upsert_package))
        .route("/admin/packages/{name}", delete(delete_package))
        .layer(from_fn_with_state(state, admin_auth))
}
