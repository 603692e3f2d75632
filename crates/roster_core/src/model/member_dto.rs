//! Read-only member projection.

use super::member::Member;
use super::MemberId;
use serde::{Deserialize, Serialize};

/// `(id, user_name, team_name)` row produced by member/team join queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub id: MemberId,
    pub user_name: String,
    /// `None` when the member has no team (listing projection only; the
    /// inner-join finder never yields it).
    pub team_name: Option<String>,
}

impl MemberDto {
    pub fn new(id: MemberId, user_name: impl Into<String>, team_name: Option<String>) -> Self {
        Self {
            id,
            user_name: user_name.into(),
            team_name,
        }
    }

    /// Projects a saved member. Returns `None` for an unsaved member.
    pub fn from_member(member: &Member, team_name: Option<String>) -> Option<Self> {
        member
            .id
            .map(|id| Self::new(id, member.user_name.clone(), team_name))
    }
}
