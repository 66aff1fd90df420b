use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{models::UserEntity, storage::InsertOutcome},
    dto::user::{CreateUserRequest, UpdateProfileRequest, UserResponse},
    error::ServiceError,
    services::availability::parse_day,
    state::{
        SharedState,
        auth::{Principal, UserRole},
    },
};

/// Every registered user.
pub async fn list_users(state: &SharedState) -> Result<Vec<UserResponse>, ServiceError> {
    let store = state.require_booking_store().await?;
    let users = store.list_users().await?;
    Ok(users.into_iter().map(Into::into).collect())
}

/// Register a user; emails are unique and stored lower-cased.
pub async fn create_user(
    state: &SharedState,
    request: CreateUserRequest,
) -> Result<UserResponse, ServiceError> {
    let store = state.require_booking_store().await?;
    let birth_date = request.birth_date.as_deref().map(parse_day).transpose()?;
    let now = state.now();
    let user = UserEntity {
        id: request.id.unwrap_or_else(Uuid::new_v4),
        name: request.name.trim().to_owned(),
        email: request.email.trim().to_lowercase(),
        phone: request.phone,
        birth_date,
        role: request.role.unwrap_or(UserRole::User),
        created_at: now,
        updated_at: now,
    };

    match store.insert_user(user.clone()).await? {
        InsertOutcome::Inserted => {
            info!(id = %user.id, role = ?user.role, "user created");
            Ok(user.into())
        }
        InsertOutcome::Duplicate => Err(ServiceError::Conflict(format!(
            "a user with email {} or id {} already exists",
            user.email, user.id
        ))),
    }
}

/// Profile of the caller.
pub async fn get_profile(
    state: &SharedState,
    principal: Principal,
) -> Result<UserResponse, ServiceError> {
    let store = state.require_booking_store().await?;
    store
        .find_user(principal.user_id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound(format!("user {}", principal.user_id)))
}

/// Update the caller's name, phone or birth date.
pub async fn update_profile(
    state: &SharedState,
    principal: Principal,
    request: UpdateProfileRequest,
) -> Result<UserResponse, ServiceError> {
    let store = state.require_booking_store().await?;
    let mut user = store
        .find_user(principal.user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("user {}", principal.user_id)))?;

    if let Some(name) = request.name {
        user.name = name.trim().to_owned();
    }
    if let Some(phone) = request.phone {
        user.phone = Some(phone);
    }
    if let Some(birth_date) = request.birth_date.as_deref() {
        user.birth_date = Some(parse_day(birth_date)?);
    }
    user.updated_at = state.now();

    store.save_user(user.clone()).await?;
    Ok(user.into())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::booking_store::memory::MemoryBookingStore, state::AppState,
    };

    async fn state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .set_booking_store(Arc::new(MemoryBookingStore::new()))
            .await;
        state
    }

    fn user(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            id: None,
            name: " Taufik ".into(),
            email: email.into(),
            phone: None,
            birth_date: Some("1981-08-10".into()),
            role: None,
        }
    }

    #[tokio::test]
    async fn emails_are_lowercased_and_unique() {
        let state = state().await;
        let created = create_user(&state, user(" Taufik@Example.COM ")).await.unwrap();
        assert_eq!(created.email, "taufik@example.com");
        assert_eq!(created.name, "Taufik");
        assert_eq!(created.role, UserRole::User);

        let err = create_user(&state, user("TAUFIK@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(list_users(&state).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn explicit_id_binds_a_preissued_token() {
        let state = state().await;
        let id = Uuid::new_v4();
        let mut request = user("coach@example.com");
        request.id = Some(id);
        request.role = Some(UserRole::Admin);
        create_user(&state, request).await.unwrap();

        let mut reused = user("other@example.com");
        reused.id = Some(id);
        let err = create_user(&state, reused).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let profile = get_profile(
            &state,
            Principal {
                user_id: id,
                role: UserRole::Admin,
            },
        )
        .await
        .unwrap();
        assert_eq!(profile.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn profile_updates_only_given_fields() {
        let state = state().await;
        let created = create_user(&state, user("taufik@example.com")).await.unwrap();
        let principal = Principal {
            user_id: created.id,
            role: UserRole::User,
        };

        let updated = update_profile(
            &state,
            principal,
            UpdateProfileRequest {
                name: None,
                phone: Some("+62 812 0000".into()),
                birth_date: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Taufik");
        assert_eq!(updated.phone.as_deref(), Some("+62 812 0000"));
        assert_eq!(updated.birth_date, created.birth_date);

        let bad_date = update_profile(
            &state,
            principal,
            UpdateProfileRequest {
                name: None,
                phone: None,
                birth_date: Some("10/08/1981".into()),
            },
        )
        .await;
        assert!(matches!(bad_date, Err(ServiceError::InvalidInput(_))));

        let stranger = Principal {
            user_id: Uuid::new_v4(),
            role: UserRole::User,
        };
        assert!(matches!(
            get_profile(&state, stranger).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
