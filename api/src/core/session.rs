//! Authenticated user taken from the auth gateway's header.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{core::app_state::AppState, error_handler::AppError};

/// The user the request runs as. Namespaces always come from here, never
/// from the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser(pub String);

impl SessionUser {
    pub fn id(&self) -> &str {
        &self.0
    }

    /// Rejects a body/query `userId` that names someone else.
    pub fn authorize(&self, claimed: &str) -> Result<(), AppError> {
        if claimed.trim().is_empty() {
            return Err(AppError::BadRequest("userId is required".into()));
        }
        if claimed != self.0 {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }
}

impl FromRequestParts<Arc<AppState>> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(state.config.auth_user_header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Unauthorized)?;
        Ok(SessionUser(user.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claimed_user_must_match_session() {
        let s = SessionUser("u1".into());
        assert!(s.authorize("u1").is_ok());
        assert!(matches!(s.authorize("u2"), Err(AppError::Forbidden)));
        assert!(matches!(s.authorize(" "), Err(AppError::BadRequest(_))));
    }
}
