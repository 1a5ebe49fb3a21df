use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::RouteController;
use crate::dto::api_response::ApiResponse;
use crate::dto::route_dto::{
    DeleteQuery, DraftResponse, EligibleCustomersQuery, EligibleCustomersResponse,
    OptimizeDraftRequest, RouteListQuery, SaveRouteRequest, TransitionRouteRequest,
    TransitionStopRequest,
};
use crate::models::{Route, Stop};
use crate::services::route_manager::{RouteBoard, RouteCard};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_route_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_routes).post(save_route))
        .route("/optimize", post(optimize_route))
        .route("/:id", get(get_route).delete(delete_route))
        .route("/:id/approve", post(approve_route))
        .route("/:id/status", post(transition_route))
        .route("/:id/stops/:stop_id/status", post(transition_stop))
}

pub fn create_technician_router() -> Router<AppState> {
    Router::new().route("/:id/eligible-customers", get(eligible_customers))
}

async fn list_routes(
    State(state): State<AppState>,
    Query(query): Query<RouteListQuery>,
) -> Result<Json<ApiResponse<RouteBoard>>, AppError> {
    let board = RouteController::new(&state).list(query).await?;
    Ok(Json(ApiResponse::success(board)))
}

async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RouteCard>>, AppError> {
    let card = RouteController::new(&state).get(id).await?;
    Ok(Json(ApiResponse::success(card)))
}

async fn save_route(
    State(state): State<AppState>,
    Json(request): Json<SaveRouteRequest>,
) -> Result<Json<ApiResponse<RouteCard>>, AppError> {
    let card = RouteController::new(&state).save(request).await?;
    Ok(Json(ApiResponse::success_with_message(
        card,
        "Route saved successfully",
    )))
}

async fn optimize_route(
    State(state): State<AppState>,
    Json(request): Json<OptimizeDraftRequest>,
) -> Result<Json<ApiResponse<DraftResponse>>, AppError> {
    let draft = RouteController::new(&state).optimize(request).await?;
    Ok(Json(ApiResponse::success(draft)))
}

async fn approve_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Route>>, AppError> {
    let route = RouteController::new(&state).approve(id).await?;
    Ok(Json(ApiResponse::success_with_message(route, "Route approved")))
}

async fn transition_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionRouteRequest>,
) -> Result<Json<ApiResponse<Route>>, AppError> {
    let route = RouteController::new(&state)
        .transition_route(id, request.status)
        .await?;
    Ok(Json(ApiResponse::success(route)))
}

async fn transition_stop(
    State(state): State<AppState>,
    Path((id, stop_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<TransitionStopRequest>,
) -> Result<Json<ApiResponse<Stop>>, AppError> {
    let stop = RouteController::new(&state)
        .set_stop_status(id, stop_id, request.status)
        .await?;
    Ok(Json(ApiResponse::success(stop)))
}

async fn delete_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    RouteController::new(&state)
        .delete(id, query.is_confirmed())
        .await?;
    Ok(Json(ApiResponse::message("Route deleted")))
}

async fn eligible_customers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<EligibleCustomersQuery>,
) -> Result<Json<ApiResponse<EligibleCustomersResponse>>, AppError> {
    let response = RouteController::new(&state)
        .eligible_customers(id, query)
        .await?;
    Ok(Json(ApiResponse::success(response)))
}
