use db::{ConnectionTrait, DbPool, models::member::Member};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::error::{Result, ServiceError, validate_text};

pub const MAX_MEMBER_NAME_CHARS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateMemberRequest {
    pub name: String,
}

#[derive(Clone, Default)]
pub struct MemberService;

impl MemberService {
    pub fn new() -> Self {
        Self
    }

    /// Resolves a presented identity. Unknown ids are `UnknownMember`.
    pub async fn find_member<C: ConnectionTrait>(db: &C, member_id: Uuid) -> Result<Member> {
        Member::find_by_id(db, member_id)
            .await?
            .ok_or(ServiceError::UnknownMember)
    }

    pub async fn rename(
        &self,
        pool: &DbPool,
        member_id: Uuid,
        payload: &UpdateMemberRequest,
    ) -> Result<Member> {
        let name = validate_text("name", &payload.name, MAX_MEMBER_NAME_CHARS)?;
        Self::find_member(pool, member_id).await?;
        Ok(Member::rename(pool, member_id, &name).await?)
    }
}
