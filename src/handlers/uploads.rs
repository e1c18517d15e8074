use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::app::AppState;
use crate::error::ApiError;

/// GET /uploads/:file - stored report, always served as PDF
pub async fn get(State(state): State<AppState>, Path(file): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.records.uploads().open(&file).await?;
    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes))
}
