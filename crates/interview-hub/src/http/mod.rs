//! HTTP surface of the hiring API: error mapping, validation helpers,
//! pagination and the generic resource routes.

mod error;
pub mod pagination;
pub mod resource;
mod state;
pub mod validation;

use axum::{middleware, Router};

pub use error::ApiError;
pub use pagination::{Page, PageParams};
pub use resource::{create_record, resource_routes, update_record, Resource};
pub use state::HubState;
pub use validation::{FieldErrors, WriteMode};

use crate::{auth, export, hiring};

/// Builds the `/api/v1` router.
///
/// Registration, login and token refresh are public; every other route requires an
/// access token. Activity is recorded for all requests, including rejected ones.
pub fn hub_router(state: HubState) -> Router {
    let protected = Router::new()
        .merge(hiring::hiring_routes())
        .merge(auth::profile_routes())
        .merge(export::export_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .nest("/api/v1", auth::auth_routes().merge(protected))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            hiring::activity::record_activity,
        ))
        .with_state(state)
}
