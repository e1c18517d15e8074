use axum::extract::State;
use serde::Serialize;

use crate::app::AppState;
use crate::database::models::Policy;
use crate::database::record::PolicyInput;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathId};

#[derive(Debug, Serialize)]
pub struct Created {
    pub id: i64,
}

/// GET /api/policies/:id
pub async fn get(State(state): State<AppState>, PathId(id): PathId<i64>) -> ApiResult<Policy> {
    match state.records.get_policy(id).await? {
        Some(policy) => Ok(ApiResponse::success(policy)),
        None => Err(ApiError::not_found(format!("policy {} not found", id))),
    }
}

/// POST /api/policies - returns 201 `{id}`
pub async fn post(State(state): State<AppState>, JsonBody(input): JsonBody<PolicyInput>) -> ApiResult<Created> {
    let id = state.records.create_policy(input).await?;
    Ok(ApiResponse::created(Created { id }))
}

/// PUT /api/policies/:id - full replace, 204 on success
pub async fn put(
    State(state): State<AppState>,
    PathId(id): PathId<i64>,
    JsonBody(input): JsonBody<PolicyInput>,
) -> ApiResult<()> {
    state.records.update_policy(id, input).await?;
    Ok(ApiResponse::no_content())
}
