//! Admin-only route handlers.

use axum::extract::State;

use crate::error::{ApiJson, Result};
use crate::services::{self, DashboardStats};
use crate::state::AppState;

/// GET /api/admin/dashboard
pub async fn dashboard(State(state): State<AppState>) -> Result<ApiJson<DashboardStats>> {
    Ok(ApiJson(services::dashboard::stats(state.pool()).await?))
}
