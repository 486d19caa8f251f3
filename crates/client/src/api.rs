use config::ServerInfo;
use db::models::{
    board::{BoardView, LayoutEntry},
    member::Member,
    project::ProjectWithRole,
    task::{CreateTask, Task, UpdateTask},
};
use reqwest::{Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use services::services::{
    board::ApplyLayoutRequest,
    member::UpdateMemberRequest,
    project::{CreateProjectRequest, JoinProjectRequest, ProjectSession},
};
use thiserror::Error;
use utils::response::ApiResponse;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to reach the board server: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Board server returned an unreadable response ({status}): {source}")]
    Decode {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },
    #[error("Board server rejected the request ({status}): {message}")]
    Api {
        status: StatusCode,
        message: String,
        /// Task ids the server did not recognize, for layout conflicts.
        stale_task_ids: Vec<Uuid>,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Transport(err) => err.status(),
            ClientError::Decode { status, .. } | ClientError::Api { status, .. } => Some(*status),
        }
    }

    pub fn stale_task_ids(&self) -> &[Uuid] {
        match self {
            ClientError::Api { stale_task_ids, .. } => stale_task_ids,
            _ => &[],
        }
    }
}

/// Typed wrapper over the board HTTP API. The member id, once known, is sent
/// as a bearer token on every call.
#[derive(Debug, Clone)]
pub struct BoardClient {
    client: reqwest::Client,
    base_url: String,
    member_id: Option<Uuid>,
}

impl BoardClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            member_id: None,
        }
    }

    pub fn with_member(mut self, member_id: Uuid) -> Self {
        self.member_id = Some(member_id);
        self
    }

    pub fn member_id(&self) -> Option<Uuid> {
        self.member_id
    }

    pub async fn health(&self) -> Result<String, ClientError> {
        self.call(Method::GET, "/health", None::<&()>).await
    }

    /// Server settings clients follow, such as the board poll interval.
    pub async fn server_info(&self) -> Result<ServerInfo, ClientError> {
        self.call(Method::GET, "/api/info", None::<&()>).await
    }

    /// Creates a project. Without a member id the server creates one from
    /// `member_name`; the returned session carries it and this client adopts it.
    pub async fn create_project(
        &mut self,
        payload: &CreateProjectRequest,
    ) -> Result<ProjectSession, ClientError> {
        let session: ProjectSession = self
            .call(Method::POST, "/api/projects", Some(payload))
            .await?;
        self.member_id = Some(session.member.id);
        Ok(session)
    }

    pub async fn join_project(
        &mut self,
        payload: &JoinProjectRequest,
    ) -> Result<ProjectSession, ClientError> {
        let session: ProjectSession = self.call(Method::POST, "/api/join", Some(payload)).await?;
        self.member_id = Some(session.member.id);
        Ok(session)
    }

    pub async fn me(&self) -> Result<Member, ClientError> {
        self.call(Method::GET, "/api/members/me", None::<&()>).await
    }

    pub async fn rename_me(&self, name: &str) -> Result<Member, ClientError> {
        let payload = UpdateMemberRequest {
            name: name.to_string(),
        };
        self.call(Method::PATCH, "/api/members/me", Some(&payload))
            .await
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectWithRole>, ClientError> {
        self.call(Method::GET, "/api/projects", None::<&()>).await
    }

    pub async fn board(&self, project_id: Uuid) -> Result<BoardView, ClientError> {
        self.call(Method::GET, &format!("/api/projects/{project_id}"), None::<&()>)
            .await
    }

    pub async fn delete_project(&self, project_id: Uuid) -> Result<(), ClientError> {
        self.call(
            Method::DELETE,
            &format!("/api/projects/{project_id}"),
            None::<&()>,
        )
        .await
    }

    pub async fn apply_layout(
        &self,
        project_id: Uuid,
        entries: Vec<LayoutEntry>,
    ) -> Result<BoardView, ClientError> {
        let payload = ApplyLayoutRequest { entries };
        self.call(
            Method::PUT,
            &format!("/api/projects/{project_id}/layout"),
            Some(&payload),
        )
        .await
    }

    pub async fn create_task(
        &self,
        project_id: Uuid,
        payload: &CreateTask,
    ) -> Result<Task, ClientError> {
        self.call(
            Method::POST,
            &format!("/api/projects/{project_id}/tasks"),
            Some(payload),
        )
        .await
    }

    pub async fn update_task(
        &self,
        project_id: Uuid,
        task_id: Uuid,
        payload: &UpdateTask,
    ) -> Result<Task, ClientError> {
        self.call(
            Method::PATCH,
            &format!("/api/projects/{project_id}/tasks/{task_id}"),
            Some(payload),
        )
        .await
    }

    pub async fn delete_task(&self, project_id: Uuid, task_id: Uuid) -> Result<(), ClientError> {
        self.call(
            Method::DELETE,
            &format!("/api/projects/{project_id}/tasks/{task_id}"),
            None::<&()>,
        )
        .await
    }

    async fn call<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(member_id) = self.member_id {
            request = request.bearer_auth(member_id);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let raw = response.text().await?;
        tracing::debug!(%method, %url, %status, "Board API call");

        decode_envelope(status, &raw)
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn decode_envelope<T: DeserializeOwned>(status: StatusCode, raw: &str) -> Result<T, ClientError> {
    let envelope: ApiResponse<Value> = match serde_json::from_str(raw) {
        Ok(envelope) => envelope,
        // Framework rejections (e.g. malformed JSON bodies) are plain text.
        Err(_) if !status.is_success() => {
            return Err(ClientError::Api {
                status,
                message: raw.trim().to_string(),
                stale_task_ids: Vec::new(),
            });
        }
        Err(source) => return Err(ClientError::Decode { status, source }),
    };

    if !status.is_success() || !envelope.is_success() {
        let message = envelope.message().unwrap_or("Unknown error").to_string();
        let stale_task_ids = envelope
            .into_data()
            .and_then(|data| serde_json::from_value(data).ok())
            .unwrap_or_default();
        return Err(ClientError::Api {
            status,
            message,
            stale_task_ids,
        });
    }

    serde_json::from_value(envelope.into_data().unwrap_or(Value::Null))
        .map_err(|source| ClientError::Decode { status, source })
}
