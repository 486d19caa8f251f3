use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{project, project_member},
    models::ids,
    types::MemberRole,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub invite_code: String,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

/// A project as seen by one of its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ProjectWithRole {
    #[serde(flatten)]
    #[ts(flatten)]
    pub project: Project,
    pub role: MemberRole,
}

impl Project {
    fn from_model(model: project::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            invite_code: model.invite_code,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = project::Entity::find()
            .filter(project::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    /// Codes are stored upper case; callers normalize before lookup.
    pub async fn find_by_invite_code<C: ConnectionTrait>(
        db: &C,
        invite_code: &str,
    ) -> Result<Option<Self>, DbErr> {
        let record = project::Entity::find()
            .filter(project::Column::InviteCode.eq(invite_code))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    /// Projects the member belongs to, most recently joined first.
    pub async fn find_for_member<C: ConnectionTrait>(
        db: &C,
        member_id: Uuid,
    ) -> Result<Vec<ProjectWithRole>, DbErr> {
        let Some(member_row_id) = ids::member_id_by_uuid(db, member_id).await? else {
            return Ok(Vec::new());
        };

        let memberships = project_member::Entity::find()
            .filter(project_member::Column::MemberId.eq(member_row_id))
            .order_by_desc(project_member::Column::JoinedAt)
            .order_by_desc(project_member::Column::Id)
            .all(db)
            .await?;
        let project_ids: Vec<i64> = memberships.iter().map(|m| m.project_id).collect();
        let mut projects: HashMap<i64, project::Model> = project::Entity::find()
            .filter(project::Column::Id.is_in(project_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|model| (model.id, model))
            .collect();

        Ok(memberships
            .into_iter()
            .filter_map(|membership| {
                projects
                    .remove(&membership.project_id)
                    .map(|model| ProjectWithRole {
                        project: Self::from_model(model),
                        role: membership.role,
                    })
            })
            .collect())
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        name: &str,
        invite_code: &str,
        project_id: Uuid,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = project::ActiveModel {
            uuid: Set(project_id),
            name: Set(name.to_string()),
            invite_code: Set(invite_code.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    /// Bumps `updated_at` and returns the row id. Run first inside a transaction it
    /// serializes every writer of the project's board behind this one.
    pub async fn lock_row<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<i64>, DbErr> {
        let result = project::Entity::update_many()
            .col_expr(project::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(project::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        ids::project_id_by_uuid(db, id).await
    }

    /// Tasks and memberships go with the project through cascading foreign keys.
    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = project::Entity::delete_many()
            .filter(project::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
