use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::UserEntity,
    dto::{
        format_system_time,
        validation::{validate_calendar_date, validate_phone},
    },
    state::{auth::UserRole, clock::format_date},
};

/// User profile.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub role: UserRole,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserEntity> for UserResponse {
    fn from(user: UserEntity) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            birth_date: user.birth_date.map(format_date),
            role: user.role,
            created_at: format_system_time(user.created_at),
            updated_at: format_system_time(user.updated_at),
        }
    }
}

/// Admin payload registering a user. `id` lets operators bind a pre-issued API token.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_calendar_date"))]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// Self-service profile update; omitted fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_calendar_date"))]
    pub birth_date: Option<String>,
}
