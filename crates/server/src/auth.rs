use crate::error::ApiError;
use axum::{extract::FromRequestParts, http::request::Parts};
use log::warn;
use models::role::{Principal, Role};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// JWT claims this service reads. The identity provider puts the account
/// type in a custom `role` claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Option<String>,
    pub role: Option<String>,
}

impl AccessClaims {
    pub fn principal(&self) -> Result<Principal, ApiError> {
        let sub = self
            .sub
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ApiError::Unauthenticated)?;

        let role = self
            .role
            .as_deref()
            .and_then(|r| Role::from_str(r).ok())
            .ok_or_else(|| {
                warn!("Rejecting {sub}: role claim {:?} is not recognized", self.role);
                ApiError::UnknownRole
            })?;

        Ok(Principal::new(sub, role))
    }
}

/// The authenticated caller, built once per request from the validated token
pub struct CurrentUser(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<AccessClaims>()
            .ok_or(ApiError::Unauthenticated)?;

        claims.principal().map(CurrentUser)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use models::role::Capability;

    fn claims(sub: Option<&str>, role: Option<&str>) -> AccessClaims {
        AccessClaims {
            sub: sub.map(str::to_owned),
            role: role.map(str::to_owned),
        }
    }

    #[test]
    fn test_role_claim_selects_capabilities() {
        let teacher = claims(Some("t1"), Some("teacher")).principal().unwrap();
        assert!(teacher.can(Capability::ManageCourses));
        assert!(!teacher.can(Capability::Enroll));

        let student = claims(Some("s1"), Some("Student")).principal().unwrap();
        assert_eq!(student.user_id, "s1");
        assert!(student.can(Capability::TrackProgress));
    }

    #[test]
    fn test_rejects_incomplete_claims() {
        assert!(matches!(
            claims(None, Some("student")).principal(),
            Err(ApiError::Unauthenticated)
        ));
        assert!(matches!(
            claims(Some("s1"), None).principal(),
            Err(ApiError::UnknownRole)
        ));
        assert!(matches!(
            claims(Some("s1"), Some("admin")).principal(),
            Err(ApiError::UnknownRole)
        ));
    }
}
