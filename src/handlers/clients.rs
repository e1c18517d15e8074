use axum::extract::State;

use crate::app::AppState;
use crate::database::models::Client;
use crate::database::record::ClientInput;
use crate::error::ApiError;
use crate::handlers::policies::Created;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathId};

/// GET /api/clients/:id
pub async fn get(State(state): State<AppState>, PathId(id): PathId<i64>) -> ApiResult<Client> {
    match state.records.get_client(id).await? {
        Some(client) => Ok(ApiResponse::success(client)),
        None => Err(ApiError::not_found(format!("client {} not found", id))),
    }
}

/**
 * POST /api/clients - create a client, storing any attached reports first
 *
 * ```json
 * {
 *   "policy_id": 1,
 *   "name": "Jane Doe",
 *   "claim_presented": true,
 *   "technical_report_file": { "name": "r.pdf", "data": "data:application/pdf;base64,..." }
 * }
 * ```
 */
pub async fn post(State(state): State<AppState>, JsonBody(input): JsonBody<ClientInput>) -> ApiResult<Created> {
    let id = state.records.create_client(input).await?;
    Ok(ApiResponse::created(Created { id }))
}

/// PUT /api/clients/:id - full replace. Report slots without a new file keep
/// `existing_*_path`, or the stored reference when that is absent too.
pub async fn put(
    State(state): State<AppState>,
    PathId(id): PathId<i64>,
    JsonBody(input): JsonBody<ClientInput>,
) -> ApiResult<()> {
    state.records.update_client(id, input).await?;
    Ok(ApiResponse::no_content())
}
