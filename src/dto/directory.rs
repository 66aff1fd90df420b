use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{ArenaEntity, CourtEntity, CourtStatus, CourtType},
    dto::format_system_time,
};

/// Arena as exposed by the directory.
#[derive(Debug, Serialize, ToSchema)]
pub struct ArenaResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub category: String,
    pub description: String,
    pub price_per_hour: i64,
    pub rating: f64,
    pub reviews_count: u32,
    pub images: Vec<String>,
    pub facilities: Vec<String>,
    pub opening_hours: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ArenaEntity> for ArenaResponse {
    fn from(arena: ArenaEntity) -> Self {
        Self {
            id: arena.id,
            name: arena.name,
            address: arena.address,
            city: arena.city,
            category: arena.category,
            description: arena.description,
            price_per_hour: arena.price_per_hour,
            rating: arena.rating,
            reviews_count: arena.reviews_count,
            images: arena.images,
            facilities: arena.facilities.into_iter().collect(),
            opening_hours: arena.opening_hours,
            created_at: format_system_time(arena.created_at),
            updated_at: format_system_time(arena.updated_at),
        }
    }
}

/// Admin payload creating or replacing an arena.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ArenaRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub address: String,
    #[validate(length(min = 1, max = 80))]
    pub city: String,
    #[validate(length(min = 1, max = 80))]
    pub category: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[validate(range(min = 0))]
    pub price_per_hour: i64,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: f64,
    #[serde(default)]
    pub reviews_count: u32,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub images: Vec<String>,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 40))]
    pub opening_hours: String,
}

/// Court as exposed by the directory.
#[derive(Debug, Serialize, ToSchema)]
pub struct CourtResponse {
    pub id: Uuid,
    pub arena_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub court_type: CourtType,
    /// Override of the arena rate, if any.
    pub price_per_hour: Option<i64>,
    pub status: CourtStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CourtEntity> for CourtResponse {
    fn from(court: CourtEntity) -> Self {
        Self {
            id: court.id,
            arena_id: court.arena_id,
            name: court.name,
            court_type: court.court_type,
            price_per_hour: court.price_per_hour,
            status: court.status,
            created_at: format_system_time(court.created_at),
            updated_at: format_system_time(court.updated_at),
        }
    }
}

/// Admin payload creating a court inside an arena.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateCourtRequest {
    pub arena_id: Uuid,
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[serde(rename = "type")]
    pub court_type: CourtType,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub price_per_hour: Option<i64>,
    #[serde(default)]
    pub status: Option<CourtStatus>,
}

/// Admin payload updating a court; omitted fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateCourtRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 80))]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub court_type: Option<CourtType>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub price_per_hour: Option<i64>,
    #[serde(default)]
    pub status: Option<CourtStatus>,
}

/// Query string of `GET /api/courts`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct CourtsQuery {
    #[serde(default)]
    pub arena_id: Option<Uuid>,
}
