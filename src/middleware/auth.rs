use axum::{extract::FromRequestParts, http::header};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    dto::auth::TokenKind,
    entity::Users,
    error::AppError,
    models::{UserRole, UserType},
    services::auth_service::decode_token,
    state::AppState,
};

/// An authenticated, active and verified account resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub user_type: UserType,
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    if !user.role.is_admin() {
        return Err(AppError::Forbidden("Admin access required".into()));
    }
    Ok(())
}

pub fn ensure_super_admin(user: &AuthUser) -> Result<(), AppError> {
    if user.role != UserRole::SuperAdmin {
        return Err(AppError::Forbidden("Super admin access required".into()));
    }
    Ok(())
}

fn bearer_token(parts: &axum::http::request::Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

    auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = decode_token(&state.config.jwt_secret, token, TokenKind::Access)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

        let user = Users::find_by_id(user_id)
            .one(&state.orm)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

        if !user.is_active {
            return Err(AppError::Forbidden("User account is deactivated".into()));
        }
        if !user.is_verified {
            return Err(AppError::Forbidden("Email not verified".into()));
        }

        Ok(AuthUser {
            user_id,
            email: user.email,
            role: user.role.parse().unwrap_or_default(),
            user_type: user.user_type.parse().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(value: Option<&str>) -> axum::http::request::Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_token_requires_scheme() {
        assert!(bearer_token(&parts_with(None)).is_err());
        assert!(bearer_token(&parts_with(Some("Basic abc"))).is_err());
        assert!(bearer_token(&parts_with(Some("Bearer "))).is_err());
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))).unwrap(), "abc.def");
    }

    #[test]
    fn only_admin_roles_pass_admin_check() {
        let mut user = AuthUser {
            user_id: Uuid::new_v4(),
            email: "a@b.test".into(),
            role: UserRole::Customer,
            user_type: UserType::B2B,
        };
        assert!(ensure_admin(&user).is_err());
        user.role = UserRole::SuperAdmin;
        assert!(ensure_admin(&user).is_ok());
    }

    #[test]
    fn plain_admins_fail_super_admin_check() {
        let mut user = AuthUser {
            user_id: Uuid::new_v4(),
            email: "ops@b.test".into(),
            role: UserRole::Admin,
            user_type: UserType::B2C,
        };
        assert!(matches!(ensure_super_admin(&user), Err(AppError::Forbidden(_))));
        user.role = UserRole::SuperAdmin;
        assert!(ensure_super_admin(&user).is_ok());
    }
}
