// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::{Actor, Role},
};

/// Define quais papéis um grupo de rotas aceita.
pub trait RoleGate: Send + Sync + 'static {
    fn allowed() -> &'static [Role];
}

pub fn require_role(actor: &Actor, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&actor.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Guardião: extrai o ator autenticado e confere o papel exigido por `G`.
pub struct RequireRole<G>(pub Actor, pub PhantomData<G>);

impl<G, S> FromRequestParts<S> for RequireRole<G>
where
    G: RoleGate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;
        let actor = user.actor();

        if let Err(e) = require_role(&actor, G::allowed()) {
            tracing::warn!(user_id = %actor.id, role = ?actor.role, "role check failed");
            return Err(e);
        }

        Ok(RequireRole(actor, PhantomData))
    }
}

// ---
// GRUPOS DE PAPÉIS
// ---

pub struct Privileged;
impl RoleGate for Privileged {
    fn allowed() -> &'static [Role] { &[Role::Superuser] }
}
