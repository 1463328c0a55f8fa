use uuid::Uuid;

use crate::application::ports::role_repository::RoleRepository;
use crate::domain::auth::role::PERM_VIEW_USER;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    None,
    Granted,
}

// Presentation layer resolves the caller; this module only answers permission questions.

pub async fn resolve_permission<R>(roles: &R, user_id: Uuid, permission: &str) -> Capability
where
    R: RoleRepository + ?Sized,
{
    match roles.role_for_user(user_id).await {
        Ok(Some(role)) if role.allows(permission) => Capability::Granted,
        Ok(_) => Capability::None,
        Err(e) => {
            tracing::error!(error = ?e, user_id = %user_id, permission, "role_lookup_failed");
            Capability::None
        }
    }
}

pub async fn require_permission<R>(roles: &R, user_id: Uuid, permission: &str) -> anyhow::Result<()>
where
    R: RoleRepository + ?Sized,
{
    match resolve_permission(roles, user_id, permission).await {
        Capability::Granted => Ok(()),
        Capability::None => anyhow::bail!("forbidden"),
    }
}

/// Users can always read themselves; reading others needs `view user`.
pub async fn can_view_user<R>(roles: &R, caller: Uuid, target: Uuid) -> bool
where
    R: RoleRepository + ?Sized,
{
    caller == target
        || resolve_permission(roles, caller, PERM_VIEW_USER).await == Capability::Granted
}
