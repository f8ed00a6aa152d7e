//! Caller identity from gateway-injected headers.
//!
//! The gateway terminates JWT authentication and forwards the verified
//! identity in headers; this service trusts them and never re-verifies
//! tokens.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user email.
pub const USER_EMAIL_HEADER: &str = "x-user-email";
/// Header carrying the user's roles, comma-separated.
pub const USER_ROLES_HEADER: &str = "x-user-roles";

const ADMIN_ROLE: &str = "admin";

/// Authenticated caller identity.
#[derive(Debug, Clone)]
pub struct UserContext {
    /// Authenticated user id.
    pub user_id: Uuid,
    /// Authenticated user email.
    pub email: String,
    /// Roles granted to the user.
    pub roles: Vec<String>,
}

impl UserContext {
    /// Extracts the caller identity from request headers.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when a required header is
    /// missing or malformed.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("missing X-User-ID header".to_string()))?;
        let user_id = Uuid::parse_str(user_id)
            .map_err(|_| ApiError::Unauthorized("invalid X-User-ID header".to_string()))?;

        let email = headers
            .get(USER_EMAIL_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("missing X-User-Email header".to_string()))?
            .to_string();

        let roles = headers
            .get(USER_ROLES_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|role| !role.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            user_id,
            email,
            roles,
        })
    }

    /// Whether the user holds a role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|held| held == role)
    }

    /// Whether the user is a platform administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    /// Checks that the caller may act on an order owned by `owner_id`.
    /// Administrators may act on any order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Forbidden`] for non-admins acting on another
    /// user's order.
    pub fn authorize_order_access(&self, owner_id: Uuid) -> Result<(), ApiError> {
        if self.is_admin() || self.user_id == owner_id {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "insufficient permissions to access this order".to_string(),
            ))
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for UserContext {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        std::future::ready(Self::from_headers(&parts.headers))
    }
}
