use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::controllers::PreferencesController;
use crate::dto::api_response::ApiResponse;
use crate::models::DayColors;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_preferences_router() -> Router<AppState> {
    Router::new().route(
        "/:owner/day-colors",
        get(get_day_colors)
            .put(update_day_colors)
            .delete(reset_day_colors),
    )
}

async fn get_day_colors(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<ApiResponse<DayColors>>, AppError> {
    let colors = PreferencesController::new(&state)
        .get_day_colors(&owner)
        .await?;
    Ok(Json(ApiResponse::success(colors)))
}

async fn update_day_colors(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    Json(colors): Json<DayColors>,
) -> Result<Json<ApiResponse<DayColors>>, AppError> {
    let colors = PreferencesController::new(&state)
        .update_day_colors(&owner, colors)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        colors,
        "Day colors updated",
    )))
}

async fn reset_day_colors(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<ApiResponse<DayColors>>, AppError> {
    let colors = PreferencesController::new(&state)
        .reset_day_colors(&owner)
        .await?;
    Ok(Json(ApiResponse::success(colors)))
}
