use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// `Path<T>` whose rejections use the API's error shape, so `/api/policies/abc`
/// answers with a JSON 400 like every other bad request.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathId<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for PathId<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(PathId(value))
    }
}
