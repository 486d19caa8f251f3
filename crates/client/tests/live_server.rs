use std::time::Duration;

use client::{BoardClient, BoardSession, ClientError, spawn_poller};
use config::Config;
use db::{
    DBService,
    models::{board::LayoutEntry, task::CreateTask},
    types::TaskStatus,
};
use reqwest::StatusCode;
use server::{AppState, http};
use services::services::project::{CreateProjectRequest, JoinProjectRequest};
use tokio::sync::watch;
use uuid::Uuid;

/// Serves a fresh in-memory board on an ephemeral port and returns its base url.
async fn spawn_server() -> String {
    spawn_server_with(Config::default()).await
}

async fn spawn_server_with(config: Config) -> String {
    let db = DBService::new("sqlite::memory:", 1).await.unwrap();
    let app = http::router(AppState::new(db, config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn task(title: &str) -> CreateTask {
    CreateTask {
        title: title.to_string(),
        ..Default::default()
    }
}

fn todo_titles(session: &BoardSession) -> Vec<String> {
    session
        .cache()
        .view()
        .map(|view| view.columns.todo.iter().map(|t| t.title.clone()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn two_members_share_one_board() {
    let base_url = spawn_server().await;
    assert_eq!(BoardClient::new(&base_url).health().await.unwrap(), "OK");

    let mut owner = BoardClient::new(&base_url);
    let created = owner
        .create_project(&CreateProjectRequest {
            name: "Launch".to_string(),
            member_name: Some("Ada".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(owner.member_id(), Some(created.member.id));

    let mut guest = BoardClient::new(&base_url);
    let joined = guest
        .join_project(&JoinProjectRequest {
            invite_code: created.project.invite_code.to_lowercase(),
            member_name: Some("Grace".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(joined.project.id, created.project.id);

    let project_id = created.project.id;
    let owner_session = BoardSession::new(owner.clone(), project_id);
    let guest_session = BoardSession::new(guest.clone(), project_id);

    let a = owner_session.add_task(&task("A")).await.unwrap();
    let b = guest_session.add_task(&task("B")).await.unwrap();
    assert_eq!((a.order, b.order), (0, 1));

    owner_session.refresh().await.unwrap();
    assert_eq!(todo_titles(&owner_session), vec!["A", "B"]);

    assert!(owner_session.move_task(b.id, TaskStatus::Todo, 0).await.unwrap());
    assert!(!owner_session.cache().is_dirty());
    assert_eq!(todo_titles(&owner_session), vec!["B", "A"]);

    assert!(guest_session.refresh().await.unwrap());
    assert_eq!(todo_titles(&guest_session), vec!["B", "A"]);

    let me = guest.rename_me("Grace H.").await.unwrap();
    assert_eq!(me.name, "Grace H.");
    assert_eq!(guest.me().await.unwrap().name, "Grace H.");

    let projects = guest.list_projects().await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].project.id, project_id);

    guest_session.delete_task(a.id).await.unwrap();
    assert_eq!(todo_titles(&guest_session), vec!["B"]);

    let err = guest.delete_project(project_id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    owner.delete_project(project_id).await.unwrap();
}

#[tokio::test]
async fn failed_layout_resynchronizes_the_cache() {
    let base_url = spawn_server().await;
    let mut owner = BoardClient::new(&base_url);
    let created = owner
        .create_project(&CreateProjectRequest {
            name: "Resync".to_string(),
            member_name: Some("Ada".to_string()),
        })
        .await
        .unwrap();
    let session = BoardSession::new(owner.clone(), created.project.id);
    let a = session.add_task(&task("A")).await.unwrap();
    session.refresh().await.unwrap();

    let stray = Uuid::new_v4();
    let err = owner
        .apply_layout(
            created.project.id,
            vec![
                LayoutEntry {
                    task_id: a.id,
                    status: TaskStatus::Done,
                    order: 0,
                },
                LayoutEntry {
                    task_id: stray,
                    status: TaskStatus::Done,
                    order: 1,
                },
            ],
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::CONFLICT));
    assert_eq!(err.stale_task_ids(), &[stray]);

    // Another member deletes the task behind this session's back.
    owner.delete_task(created.project.id, a.id).await.unwrap();
    let result = session.move_task(a.id, TaskStatus::Done, 0).await;
    assert!(matches!(result, Err(ClientError::Api { .. })));
    assert!(!session.cache().is_dirty());
    assert!(session.cache().view().unwrap().columns.is_empty());
}

#[tokio::test]
async fn requests_without_identity_are_rejected() {
    let base_url = spawn_server().await;
    let anonymous = BoardClient::new(&base_url);
    let err = anonymous.list_projects().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));

    let stranger = BoardClient::new(&base_url).with_member(Uuid::new_v4());
    let err = stranger.me().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
}

#[tokio::test]
async fn server_info_sets_the_poll_interval() {
    let base_url = spawn_server_with(Config {
        poll_interval_secs: 5,
        ..Config::default()
    })
    .await;

    let info = BoardClient::new(&base_url).server_info().await.unwrap();
    assert_eq!(info.poll_interval_secs, 5);
    assert_eq!(info.poll_interval(), Duration::from_secs(5));
}

#[tokio::test]
async fn poller_refreshes_until_shutdown() {
    let base_url = spawn_server().await;
    let mut owner = BoardClient::new(&base_url);
    let created = owner
        .create_project(&CreateProjectRequest {
            name: "Polling".to_string(),
            member_name: Some("Ada".to_string()),
        })
        .await
        .unwrap();
    let session = BoardSession::new(owner.clone(), created.project.id);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = spawn_poller(session.clone(), Duration::from_millis(20), shutdown_rx);

    owner.create_task(created.project.id, &task("Remote")).await.unwrap();

    let mut seen = false;
    for _ in 0..100 {
        if todo_titles(&session) == vec!["Remote"] {
            seen = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(seen, "poller never picked up the remote task");

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), poller)
        .await
        .unwrap()
        .unwrap();
}
