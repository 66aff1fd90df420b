use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{ArenaEntity, CourtEntity, CourtStatus},
    dto::directory::{
        ArenaRequest, ArenaResponse, CourtResponse, CreateCourtRequest, UpdateCourtRequest,
    },
    error::ServiceError,
    state::SharedState,
};

/// All arenas, oldest first.
pub async fn list_arenas(state: &SharedState) -> Result<Vec<ArenaResponse>, ServiceError> {
    let store = state.require_booking_store().await?;
    let arenas = store.list_arenas().await?;
    Ok(arenas.into_iter().map(Into::into).collect())
}

/// Load a single arena.
pub async fn get_arena(state: &SharedState, id: Uuid) -> Result<ArenaResponse, ServiceError> {
    let store = state.require_booking_store().await?;
    store
        .find_arena(id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound(format!("arena {id}")))
}

fn arena_from_request(
    request: ArenaRequest,
    id: Uuid,
    created_at: SystemTime,
    now: SystemTime,
) -> ArenaEntity {
    ArenaEntity {
        id,
        name: request.name.trim().to_owned(),
        address: request.address,
        city: request.city,
        category: request.category,
        description: request.description,
        price_per_hour: request.price_per_hour,
        rating: request.rating,
        reviews_count: request.reviews_count,
        images: request.images,
        facilities: request
            .facilities
            .into_iter()
            .map(|facility| facility.trim().to_owned())
            .filter(|facility| !facility.is_empty())
            .collect(),
        opening_hours: request.opening_hours,
        created_at,
        updated_at: now,
    }
}

/// Register a new arena.
pub async fn create_arena(
    state: &SharedState,
    request: ArenaRequest,
) -> Result<ArenaResponse, ServiceError> {
    let store = state.require_booking_store().await?;
    let now = state.now();
    let arena = arena_from_request(request, Uuid::new_v4(), now, now);
    store.save_arena(arena.clone()).await?;
    info!(id = %arena.id, name = %arena.name, "arena created");
    Ok(arena.into())
}

/// Replace an existing arena.
pub async fn update_arena(
    state: &SharedState,
    id: Uuid,
    request: ArenaRequest,
) -> Result<ArenaResponse, ServiceError> {
    let store = state.require_booking_store().await?;
    let existing = store
        .find_arena(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("arena {id}")))?;
    let arena = arena_from_request(request, id, existing.created_at, state.now());
    store.save_arena(arena.clone()).await?;
    info!(%id, "arena updated");
    Ok(arena.into())
}

/// Courts, optionally restricted to one arena.
pub async fn list_courts(
    state: &SharedState,
    arena_id: Option<Uuid>,
) -> Result<Vec<CourtResponse>, ServiceError> {
    let store = state.require_booking_store().await?;
    let courts = store.list_courts(arena_id).await?;
    Ok(courts.into_iter().map(Into::into).collect())
}

/// Load a single court.
pub async fn get_court(state: &SharedState, id: Uuid) -> Result<CourtResponse, ServiceError> {
    let store = state.require_booking_store().await?;
    store
        .find_court(id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound(format!("court {id}")))
}

/// Add a court to an existing arena.
pub async fn create_court(
    state: &SharedState,
    request: CreateCourtRequest,
) -> Result<CourtResponse, ServiceError> {
    let store = state.require_booking_store().await?;
    store
        .find_arena(request.arena_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("arena {}", request.arena_id)))?;

    let now = state.now();
    let court = CourtEntity {
        id: Uuid::new_v4(),
        arena_id: request.arena_id,
        name: request.name.trim().to_owned(),
        court_type: request.court_type,
        price_per_hour: request.price_per_hour,
        status: request.status.unwrap_or(CourtStatus::Active),
        created_at: now,
        updated_at: now,
    };
    store.save_court(court.clone()).await?;
    info!(id = %court.id, arena_id = %court.arena_id, "court created");
    Ok(court.into())
}

/// Update the name, type, rate or status of a court.
pub async fn update_court(
    state: &SharedState,
    id: Uuid,
    request: UpdateCourtRequest,
) -> Result<CourtResponse, ServiceError> {
    let store = state.require_booking_store().await?;
    let mut court = store
        .find_court(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("court {id}")))?;

    if let Some(name) = request.name {
        court.name = name.trim().to_owned();
    }
    if let Some(court_type) = request.court_type {
        court.court_type = court_type;
    }
    if let Some(price) = request.price_per_hour {
        court.price_per_hour = Some(price);
    }
    if let Some(status) = request.status {
        court.status = status;
    }
    court.updated_at = state.now();

    store.save_court(court.clone()).await?;
    info!(%id, status = ?court.status, "court updated");
    Ok(court.into())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{booking_store::memory::MemoryBookingStore, models::CourtType},
        state::AppState,
    };

    async fn state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .set_booking_store(Arc::new(MemoryBookingStore::new()))
            .await;
        state
    }

    fn arena(name: &str) -> ArenaRequest {
        ArenaRequest {
            name: name.into(),
            address: "Jl. Merdeka 1".into(),
            city: "Bandung".into(),
            category: "indoor".into(),
            description: String::new(),
            price_per_hour: 50_000,
            rating: 4.5,
            reviews_count: 0,
            images: Vec::new(),
            facilities: vec![" parking ".into(), "".into(), "showers".into()],
            opening_hours: "06:00 - 24:00".into(),
        }
    }

    fn court(arena_id: Uuid) -> CreateCourtRequest {
        CreateCourtRequest {
            arena_id,
            name: "Court 1".into(),
            court_type: CourtType::Premium,
            price_per_hour: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn courts_require_an_existing_arena() {
        let state = state().await;
        let err = create_court(&state, court(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(list_courts(&state, None).await.unwrap().is_empty());

        let arena = create_arena(&state, arena("Smash Hall")).await.unwrap();
        let created = create_court(&state, court(arena.id)).await.unwrap();
        assert_eq!(created.status, CourtStatus::Active);
        assert_eq!(list_courts(&state, Some(arena.id)).await.unwrap().len(), 1);
        assert!(list_courts(&state, Some(Uuid::new_v4())).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn arena_update_keeps_creation_time() {
        let state = state().await;
        let created = create_arena(&state, arena("Smash Hall")).await.unwrap();
        assert_eq!(created.facilities, vec!["parking", "showers"]);

        let updated = update_arena(&state, created.id, arena("Drop Shot"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Drop Shot");
        assert_eq!(updated.created_at, created.created_at);

        let missing = update_arena(&state, Uuid::new_v4(), arena("Nowhere")).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn court_status_can_be_changed() {
        let state = state().await;
        let arena = create_arena(&state, arena("Smash Hall")).await.unwrap();
        let created = create_court(&state, court(arena.id)).await.unwrap();

        let updated = update_court(
            &state,
            created.id,
            UpdateCourtRequest {
                name: None,
                court_type: None,
                price_per_hour: Some(80_000),
                status: Some(CourtStatus::Maintenance),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.status, CourtStatus::Maintenance);
        assert_eq!(updated.price_per_hour, Some(80_000));
        assert_eq!(updated.name, "Court 1");
    }
}
