// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{User, UserRole},
};

/// 1. O Trait que define o papel exigido por uma rota
pub trait RoleDef: Send + Sync + 'static {
    fn role() -> UserRole;
}

/// 2. O Extractor (Guardião)
/// Sem usuário válido responde 401; com papel errado, 403.
pub struct RequireRole<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Se o auth_guard já rodou nesta rota, o usuário está nos
        // extensions. Caso contrário (rotas com leitura pública no mesmo
        // router), validamos o Bearer token aqui mesmo.
        let user = match parts.extensions.get::<User>() {
            Some(user) => user.clone(),
            None => {
                let token = parts
                    .headers
                    .get("Authorization")
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.strip_prefix("Bearer "))
                    .ok_or(AppError::InvalidToken)?;

                let app_state = AppState::from_ref(state);
                let user = app_state.auth_service.validate_token(token).await?;
                parts.extensions.insert(user.clone());
                user
            }
        };

        if user.role != T::role() {
            return Err(AppError::Forbidden);
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct RoleAdmin;
impl RoleDef for RoleAdmin {
    fn role() -> UserRole {
        UserRole::Admin
    }
}

pub struct RoleClient;
impl RoleDef for RoleClient {
    fn role() -> UserRole {
        UserRole::Client
    }
}
