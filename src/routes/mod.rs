use axum::{Router, middleware};

use crate::state::SharedState;

pub mod auth;
pub mod bookings;
pub mod directory;
pub mod docs;
pub mod health;
pub mod sse;
pub mod users;
pub mod vouchers;

/// Compose all route trees under `/api`, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let public = health::router()
        .merge(sse::router())
        .merge(directory::public_router())
        .merge(vouchers::public_router())
        .merge(bookings::public_router());

    let authenticated = bookings::user_router()
        .merge(vouchers::user_router())
        .merge(users::user_router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let admin = bookings::admin_router()
        .merge(directory::admin_router())
        .merge(vouchers::admin_router())
        .merge(users::admin_router())
        .route_layer(middleware::from_fn(auth::require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let api_router = Router::new().nest("/api", public.merge(authenticated).merge(admin));
    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
