use axum::extract::State;

use crate::app::AppState;
use crate::database::models::PolicyClientRow;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/policy-clients - flat policy/client listing for the main table
pub async fn get(State(state): State<AppState>) -> ApiResult<Vec<PolicyClientRow>> {
    let rows = state.records.list_policy_clients().await?;
    Ok(ApiResponse::success(rows))
}
