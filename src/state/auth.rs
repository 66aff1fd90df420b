use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Role attached to a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    User,
}

/// Authenticated caller resolved from a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Principal {
    /// Whether the caller holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Whether the caller may act on a resource owned by `owner`.
    pub fn can_access(&self, owner: Uuid) -> bool {
        self.is_admin() || self.user_id == owner
    }
}

/// Bearer tokens accepted by the API, keyed by the raw token value.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    tokens: DashMap<String, Principal>,
}

impl TokenRegistry {
    /// Build a registry from `(token, principal)` pairs.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Principal)>) -> Self {
        let tokens = DashMap::new();
        for (token, principal) in entries {
            tokens.insert(token, principal);
        }
        Self { tokens }
    }

    /// Resolve a token into its principal.
    pub fn resolve(&self, token: &str) -> Option<Principal> {
        self.tokens.get(token).map(|entry| *entry.value())
    }

    /// Register or replace a token.
    pub fn insert(&self, token: impl Into<String>, principal: Principal) {
        self.tokens.insert(token.into(), principal);
    }
}
