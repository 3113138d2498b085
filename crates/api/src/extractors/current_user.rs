//! The authenticated caller, inserted by the auth middleware.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::{User, UserRole};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    /// Session the request was authenticated with.
    pub jti: String,
}

impl CurrentUser {
    pub fn from_user(user: &User, jti: impl Into<String>) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
            jti: jti.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn user(role: UserRole) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "clerk@example.com".to_string(),
            display_name: "Clerk".to_string(),
            role,
            jti: "jti-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_extension_is_unauthorized() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let result = CurrentUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_reads_extension() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts.extensions.insert(user(UserRole::Admin));
        let current = CurrentUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(current.is_admin());
        assert_eq!(current.jti, "jti-1");
    }
}
