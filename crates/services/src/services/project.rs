use db::{
    ConnectionTrait, DbErr, DbPool, SqlErr, TransactionSession, TransactionTrait,
    models::{
        member::Member,
        project::{Project, ProjectWithRole},
        project_member::ProjectMember,
    },
    types::MemberRole,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    error::{Result, ServiceError, validate_text},
    invite::{MAX_INVITE_CODE_ATTEMPTS, generate_invite_code, normalize_invite_code},
    member::{MAX_MEMBER_NAME_CHARS, MemberService},
};

pub const MAX_PROJECT_NAME_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateProjectRequest {
    pub name: String,
    /// Display name for a new member; ignored when the caller already has an id.
    pub member_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct JoinProjectRequest {
    pub invite_code: String,
    pub member_name: Option<String>,
}

/// Result of creating or joining: the member id is what the client keeps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ProjectSession {
    pub project: Project,
    pub member: Member,
    pub role: MemberRole,
}

#[derive(Clone)]
pub struct ProjectService {
    generate_code: fn() -> String,
}

impl Default for ProjectService {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectService {
    pub fn new() -> Self {
        Self {
            generate_code: generate_invite_code,
        }
    }

    pub fn with_code_generator(generate_code: fn() -> String) -> Self {
        Self { generate_code }
    }

    pub async fn create_project(
        &self,
        pool: &DbPool,
        caller: Option<Uuid>,
        payload: &CreateProjectRequest,
    ) -> Result<ProjectSession> {
        let name = validate_text("name", &payload.name, MAX_PROJECT_NAME_CHARS)?;

        let txn = pool.begin().await?;
        let member = resolve_member(&txn, caller, payload.member_name.as_deref()).await?;
        let project = self.insert_with_fresh_code(&txn, &name).await?;
        ProjectMember::add(&txn, project.id, member.id, MemberRole::Owner).await?;
        txn.commit().await?;

        tracing::info!(project_id = %project.id, member_id = %member.id, "Created project");
        Ok(ProjectSession {
            project,
            member,
            role: MemberRole::Owner,
        })
    }

    /// Each attempt runs in a savepoint so a code collision does not poison the
    /// surrounding transaction.
    async fn insert_with_fresh_code<C>(&self, db: &C, name: &str) -> Result<Project>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        for attempt in 1..=MAX_INVITE_CODE_ATTEMPTS {
            let code = (self.generate_code)();
            let savepoint = db.begin().await?;
            match Project::create(&savepoint, name, &code, Uuid::new_v4()).await {
                Ok(project) => {
                    savepoint.commit().await?;
                    return Ok(project);
                }
                Err(err) if is_unique_violation(&err) => {
                    savepoint.rollback().await?;
                    tracing::debug!(attempt, "Invite code collision, regenerating");
                }
                Err(err) => return Err(err.into()),
            }
        }

        tracing::warn!(
            attempts = MAX_INVITE_CODE_ATTEMPTS,
            "Gave up generating a unique invite code"
        );
        Err(ServiceError::InviteCodeGenerationFailed)
    }

    /// Joining a project twice returns the existing membership.
    pub async fn join_project(
        &self,
        pool: &DbPool,
        caller: Option<Uuid>,
        payload: &JoinProjectRequest,
    ) -> Result<ProjectSession> {
        let code = normalize_invite_code(&payload.invite_code);
        if code.is_empty() {
            return Err(ServiceError::Validation(
                "invite_code must not be empty".to_string(),
            ));
        }
        let project = Project::find_by_invite_code(pool, &code)
            .await?
            .ok_or(ServiceError::InviteCodeNotFound)?;

        let txn = pool.begin().await?;
        let member = resolve_member(&txn, caller, payload.member_name.as_deref()).await?;
        if let Some(existing) = ProjectMember::find(&txn, project.id, member.id).await? {
            txn.commit().await?;
            return Ok(ProjectSession {
                project,
                member,
                role: existing.role,
            });
        }

        let role = match ProjectMember::add(&txn, project.id, member.id, MemberRole::Member).await
        {
            Ok(membership) => {
                txn.commit().await?;
                tracing::info!(
                    project_id = %project.id,
                    member_id = %member.id,
                    "Member joined project"
                );
                membership.role
            }
            // A concurrent join by the same member won the insert.
            Err(err) if is_unique_violation(&err) => {
                txn.rollback().await?;
                ProjectMember::find(pool, project.id, member.id)
                    .await?
                    .map(|membership| membership.role)
                    .ok_or(ServiceError::Database(err))?
            }
            Err(err) => return Err(err.into()),
        };

        Ok(ProjectSession {
            project,
            member,
            role,
        })
    }

    pub async fn list_for_member(
        &self,
        pool: &DbPool,
        member_id: Uuid,
    ) -> Result<Vec<ProjectWithRole>> {
        Ok(Project::find_for_member(pool, member_id).await?)
    }

    /// Gate for every project-scoped operation.
    pub async fn require_membership(
        &self,
        pool: &DbPool,
        project_id: Uuid,
        member_id: Uuid,
    ) -> Result<(Project, ProjectMember)> {
        let project = Project::find_by_id(pool, project_id)
            .await?
            .ok_or(ServiceError::ProjectNotFound)?;
        let membership = ProjectMember::find(pool, project_id, member_id)
            .await?
            .ok_or(ServiceError::NotAMember)?;
        Ok((project, membership))
    }

    pub async fn delete_project(
        &self,
        pool: &DbPool,
        project_id: Uuid,
        member_id: Uuid,
    ) -> Result<u64> {
        let (_, membership) = self.require_membership(pool, project_id, member_id).await?;
        if membership.role != MemberRole::Owner {
            return Err(ServiceError::NotOwner);
        }

        let rows_affected = Project::delete(pool, project_id).await?;
        tracing::info!(%project_id, "Deleted project");
        Ok(rows_affected)
    }
}

async fn resolve_member<C: ConnectionTrait>(
    db: &C,
    caller: Option<Uuid>,
    member_name: Option<&str>,
) -> Result<Member> {
    match caller {
        Some(member_id) => MemberService::find_member(db, member_id).await,
        None => {
            let name = member_name.ok_or_else(|| {
                ServiceError::Validation(
                    "member_name is required when no member id is presented".to_string(),
                )
            })?;
            let name = validate_text("member_name", name, MAX_MEMBER_NAME_CHARS)?;
            Ok(Member::create(db, &name, Uuid::new_v4()).await?)
        }
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
