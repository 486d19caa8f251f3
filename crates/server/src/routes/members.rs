use axum::{Json, Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::member::Member;
use services::services::member::UpdateMemberRequest;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, http::auth::CurrentMember};

pub async fn get_me(
    CurrentMember(member): CurrentMember,
) -> Result<ResponseJson<ApiResponse<Member>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(member)))
}

pub async fn update_me(
    State(state): State<AppState>,
    CurrentMember(member): CurrentMember,
    Json(payload): Json<UpdateMemberRequest>,
) -> Result<ResponseJson<ApiResponse<Member>>, ApiError> {
    let member = state
        .members()
        .rename(state.db(), member.id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(member)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/members/me", get(get_me).patch(update_me))
}
