use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::user::{CreateUserRequest, UpdateProfileRequest, UserResponse},
    error::AppError,
    services::user_service,
    state::{SharedState, auth::Principal},
};

/// Profile of the signed-in caller.
pub fn user_router() -> Router<SharedState> {
    Router::new().route("/users/me", get(get_profile).put(update_profile))
}

/// User administration.
pub fn admin_router() -> Router<SharedState> {
    Router::new().route("/admin/users", get(list_users).post(create_user))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller profile", body = UserResponse),
        (status = 404, description = "Token is not bound to a registered user")
    )
)]
/// Profile of the caller.
pub async fn get_profile(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(user_service::get_profile(&state, principal).await?))
}

#[utoipa::path(
    put,
    path = "/api/users/me",
    tag = "users",
    security(("bearer" = [])),
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Updated profile", body = UserResponse))
)]
/// Update the caller's profile.
pub async fn update_profile(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Valid(Json(payload)): Valid<Json<UpdateProfileRequest>>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(
        user_service::update_profile(&state, principal, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    security(("bearer" = [])),
    responses((status = 200, description = "All users", body = [UserResponse]))
)]
/// List every user.
pub async fn list_users(
    State(state): State<SharedState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    Ok(Json(user_service::list_users(&state).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/users",
    tag = "admin",
    security(("bearer" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 409, description = "Email or id already registered")
    )
)]
/// Register a user.
pub async fn create_user(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateUserRequest>>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = user_service::create_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
