use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::content::{AdminContext, AdminId};
use crate::infrastructure::http::api::ApiError;

pub const ADMIN_ID_HEADER: &str = "x-admin-id";

/// The acting admin, taken from the `x-admin-id` header.
impl<S> FromRequestParts<S> for AdminContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin_id = parts
            .headers
            .get(ADMIN_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| AdminId::try_new(value).ok())
            .ok_or_else(|| ApiError::Unauthorized("not logged in as admin".to_string()))?;

        Ok(AdminContext::new(admin_id))
    }
}
