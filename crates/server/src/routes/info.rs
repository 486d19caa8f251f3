use axum::{extract::State, response::Json};
use config::ServerInfo;
use utils::response::ApiResponse;

use crate::AppState;

pub async fn get_info(State(state): State<AppState>) -> Json<ApiResponse<ServerInfo>> {
    Json(ApiResponse::success(ServerInfo::from(state.config())))
}
