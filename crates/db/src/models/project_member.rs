use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{member, project_member},
    models::ids,
    types::MemberRole,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ProjectMember {
    pub project_id: Uuid,
    pub member_id: Uuid,
    pub role: MemberRole,
    #[ts(type = "Date")]
    pub joined_at: DateTime<Utc>,
}

/// Roster entry shown on a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct MemberSummary {
    pub id: Uuid,
    pub name: String,
    pub role: MemberRole,
    #[ts(type = "Date")]
    pub joined_at: DateTime<Utc>,
}

impl ProjectMember {
    pub async fn add<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
        member_id: Uuid,
        role: MemberRole,
    ) -> Result<Self, DbErr> {
        let project_row_id = ids::project_id_by_uuid(db, project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
        let member_row_id = ids::member_id_by_uuid(db, member_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Member not found".to_string()))?;

        let active = project_member::ActiveModel {
            project_id: Set(project_row_id),
            member_id: Set(member_row_id),
            role: Set(role),
            joined_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self {
            project_id,
            member_id,
            role: model.role,
            joined_at: model.joined_at,
        })
    }

    pub async fn find<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let Some(project_row_id) = ids::project_id_by_uuid(db, project_id).await? else {
            return Ok(None);
        };
        let Some(member_row_id) = ids::member_id_by_uuid(db, member_id).await? else {
            return Ok(None);
        };

        let record = Self::find_by_row_ids(db, project_row_id, member_row_id).await?;
        Ok(record.map(|model| Self {
            project_id,
            member_id,
            role: model.role,
            joined_at: model.joined_at,
        }))
    }

    pub(crate) async fn find_by_row_ids<C: ConnectionTrait>(
        db: &C,
        project_row_id: i64,
        member_row_id: i64,
    ) -> Result<Option<project_member::Model>, DbErr> {
        project_member::Entity::find()
            .filter(project_member::Column::ProjectId.eq(project_row_id))
            .filter(project_member::Column::MemberId.eq(member_row_id))
            .one(db)
            .await
    }

    /// Members of a project in join order.
    pub async fn list_for_project<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
    ) -> Result<Vec<MemberSummary>, DbErr> {
        let Some(project_row_id) = ids::project_id_by_uuid(db, project_id).await? else {
            return Ok(Vec::new());
        };

        let memberships = project_member::Entity::find()
            .filter(project_member::Column::ProjectId.eq(project_row_id))
            .order_by_asc(project_member::Column::JoinedAt)
            .order_by_asc(project_member::Column::Id)
            .all(db)
            .await?;
        let member_ids: Vec<i64> = memberships.iter().map(|m| m.member_id).collect();
        let mut members: HashMap<i64, member::Model> = member::Entity::find()
            .filter(member::Column::Id.is_in(member_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|model| (model.id, model))
            .collect();

        Ok(memberships
            .into_iter()
            .filter_map(|membership| {
                members
                    .remove(&membership.member_id)
                    .map(|member| MemberSummary {
                        id: member.uuid,
                        name: member.name,
                        role: membership.role,
                        joined_at: membership.joined_at,
                    })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{Database, DatabaseConnection, SqlErr};
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::{member::Member, project::Project};

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn membership_is_unique_per_project() {
        let db = setup_db().await;
        let member = Member::create(&db, "Sam", Uuid::new_v4()).await.unwrap();
        let project = Project::create(&db, "Board", "BOARD234", Uuid::new_v4())
            .await
            .unwrap();

        ProjectMember::add(&db, project.id, member.id, MemberRole::Member)
            .await
            .unwrap();
        let err = ProjectMember::add(&db, project.id, member.id, MemberRole::Member)
            .await
            .unwrap_err();
        assert!(matches!(
            err.sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn only_one_owner_per_project() {
        let db = setup_db().await;
        let first = Member::create(&db, "First", Uuid::new_v4()).await.unwrap();
        let second = Member::create(&db, "Second", Uuid::new_v4()).await.unwrap();
        let project = Project::create(&db, "Board", "OWNR2345", Uuid::new_v4())
            .await
            .unwrap();

        ProjectMember::add(&db, project.id, first.id, MemberRole::Owner)
            .await
            .unwrap();
        let err = ProjectMember::add(&db, project.id, second.id, MemberRole::Owner)
            .await
            .unwrap_err();
        assert!(matches!(
            err.sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn roster_lists_members_in_join_order() {
        let db = setup_db().await;
        let owner = Member::create(&db, "Owner", Uuid::new_v4()).await.unwrap();
        let guest = Member::create(&db, "Guest", Uuid::new_v4()).await.unwrap();
        let project = Project::create(&db, "Board", "ROST2345", Uuid::new_v4())
            .await
            .unwrap();
        ProjectMember::add(&db, project.id, owner.id, MemberRole::Owner)
            .await
            .unwrap();
        ProjectMember::add(&db, project.id, guest.id, MemberRole::Member)
            .await
            .unwrap();

        let roster = ProjectMember::list_for_project(&db, project.id).await.unwrap();
        let names: Vec<&str> = roster.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Owner", "Guest"]);
        assert_eq!(roster[0].role, MemberRole::Owner);

        let found = ProjectMember::find(&db, project.id, guest.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.role, MemberRole::Member);
        assert!(
            ProjectMember::find(&db, project.id, Uuid::new_v4())
                .await
                .unwrap()
                .is_none()
        );
    }
}
