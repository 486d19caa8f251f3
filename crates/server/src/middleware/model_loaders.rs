use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use db::DbPool;
use serde::Deserialize;
use services::services::project::ProjectService;
use uuid::Uuid;

use crate::{AppState, error::ApiError, http::auth::CurrentMember};

pub trait ModelLoaderDeps {
    fn db_pool(&self) -> &DbPool;
    fn project_service(&self) -> &ProjectService;
}

impl ModelLoaderDeps for AppState {
    fn db_pool(&self) -> &DbPool {
        self.db()
    }

    fn project_service(&self) -> &ProjectService {
        self.projects()
    }
}

/// Path params of every project-scoped route. Extra params such as `task_id`
/// are ignored here and extracted by the handler.
#[derive(Debug, Deserialize)]
pub struct ProjectPath {
    pub project_id: Uuid,
}

/// Gate for every route under `/projects/{project_id}`: the caller must be a
/// member. Inserts the loaded `Project` and the caller's `ProjectMember`.
pub async fn load_project_membership_middleware<S>(
    State(deps): State<S>,
    Path(path): Path<ProjectPath>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    S: ModelLoaderDeps,
{
    let Some(CurrentMember(member)) = request.extensions().get::<CurrentMember>().cloned() else {
        return Err(ApiError::Unauthorized);
    };

    let (project, membership) = deps
        .project_service()
        .require_membership(deps.db_pool(), path.project_id, member.id)
        .await
        .inspect_err(|err| {
            tracing::warn!(
                project_id = %path.project_id,
                member_id = %member.id,
                error = %err,
                "Project access denied"
            );
        })?;

    request.extensions_mut().insert(project);
    request.extensions_mut().insert(membership);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension, Router,
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
    };
    use config::Config;
    use db::{DBService, models::project::Project};
    use services::services::project::CreateProjectRequest;
    use tower::ServiceExt;

    use super::*;

    async fn project_name(Extension(project): Extension<Project>) -> String {
        project.name
    }

    async fn setup() -> (AppState, Router) {
        let db = DBService::new("sqlite::memory:", 1).await.unwrap();
        let state = AppState::new(db, Config::default());
        let router = Router::new()
            .route("/projects/{project_id}", get(project_name))
            .layer(from_fn_with_state(
                state.clone(),
                load_project_membership_middleware::<AppState>,
            ))
            .layer(from_fn_with_state(state.clone(), crate::http::auth::resolve_member))
            .with_state(state.clone());
        (state, router)
    }

    fn get_as(uri: &str, member: Option<Uuid>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri(uri);
        if let Some(member) = member {
            builder = builder.header("authorization", format!("Bearer {member}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn members_pass_and_others_are_rejected() {
        let (state, router) = setup().await;
        let session = state
            .projects()
            .create_project(
                state.db(),
                None,
                &CreateProjectRequest {
                    name: "Gate".to_string(),
                    member_name: Some("Owner".to_string()),
                },
            )
            .await
            .unwrap();
        let outsider = state
            .projects()
            .create_project(
                state.db(),
                None,
                &CreateProjectRequest {
                    name: "Elsewhere".to_string(),
                    member_name: Some("Outsider".to_string()),
                },
            )
            .await
            .unwrap();
        let uri = format!("/projects/{}", session.project.id);

        let ok = router
            .clone()
            .oneshot(get_as(&uri, Some(session.member.id)))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let forbidden = router
            .clone()
            .oneshot(get_as(&uri, Some(outsider.member.id)))
            .await
            .unwrap();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let anonymous = router.clone().oneshot(get_as(&uri, None)).await.unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let missing = router
            .oneshot(get_as(
                &format!("/projects/{}", Uuid::new_v4()),
                Some(session.member.id),
            ))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
