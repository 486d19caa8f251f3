use axum::{
    Extension, Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::{
    board::BoardView,
    project::{Project, ProjectWithRole},
};
use services::services::{
    board::ApplyLayoutRequest,
    project::{CreateProjectRequest, JoinProjectRequest, ProjectSession},
};
use utils::response::ApiResponse;

use crate::{
    AppState, error::ApiError, http::auth::CurrentMember,
    middleware::model_loaders::load_project_membership_middleware, routes::tasks,
};

pub async fn create_project(
    State(state): State<AppState>,
    caller: Option<CurrentMember>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<ResponseJson<ApiResponse<ProjectSession>>, ApiError> {
    let caller_id = caller.map(|CurrentMember(member)| member.id);
    let session = state
        .projects()
        .create_project(state.db(), caller_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(session)))
}

pub async fn join_project(
    State(state): State<AppState>,
    caller: Option<CurrentMember>,
    Json(payload): Json<JoinProjectRequest>,
) -> Result<ResponseJson<ApiResponse<ProjectSession>>, ApiError> {
    let caller_id = caller.map(|CurrentMember(member)| member.id);
    let session = state
        .projects()
        .join_project(state.db(), caller_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(session)))
}

pub async fn list_projects(
    State(state): State<AppState>,
    CurrentMember(member): CurrentMember,
) -> Result<ResponseJson<ApiResponse<Vec<ProjectWithRole>>>, ApiError> {
    let projects = state.projects().list_for_member(state.db(), member.id).await?;
    Ok(ResponseJson(ApiResponse::success(projects)))
}

pub async fn get_board(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<BoardView>>, ApiError> {
    let view = state.board().board_view(state.db(), project.id).await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

pub async fn delete_project(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
    CurrentMember(member): CurrentMember,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state
        .projects()
        .delete_project(state.db(), project.id, member.id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn apply_layout(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
    Json(payload): Json<ApplyLayoutRequest>,
) -> Result<ResponseJson<ApiResponse<BoardView>>, ApiError> {
    tracing::debug!(
        project_id = %project.id,
        entries = payload.entries.len(),
        "Applying layout"
    );
    let view = state
        .board()
        .apply_layout(state.db(), project.id, &payload.entries)
        .await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let project_id_router = Router::new()
        .route("/", get(get_board).delete(delete_project))
        .route("/layout", put(apply_layout))
        .nest("/tasks", tasks::router())
        .layer(from_fn_with_state(
            state.clone(),
            load_project_membership_middleware::<AppState>,
        ));

    let projects_router = Router::new()
        .route("/", get(list_projects).post(create_project))
        .nest("/{project_id}", project_id_router);

    Router::new()
        .route("/join", post(join_project))
        .nest("/projects", projects_router)
}
