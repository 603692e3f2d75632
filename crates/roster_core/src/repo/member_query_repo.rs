//! Hand-written member queries outside the derived finder set.
//!
//! `MemberCustomRepository` extends the member repository in place;
//! `MemberQueryRepository` stands alone on a session for callers that do not
//! need the full member contract.

use crate::model::member::Member;
use crate::repo::ensure_connection_ready;
use crate::repo::error::RepoResult;
use crate::repo::member_repo::{parse_member_row, SqliteMemberRepository};
use crate::session::Session;

const ALL_MEMBERS_SQL: &str = "SELECT member_id, user_name, age, team_id
FROM members
ORDER BY member_id ASC;";

/// Custom query extension implemented next to the derived finders.
pub trait MemberCustomRepository {
    /// Every member, through a raw statement.
    fn find_member_custom(&self) -> RepoResult<Vec<Member>>;
}

impl MemberCustomRepository for SqliteMemberRepository<'_> {
    fn find_member_custom(&self) -> RepoResult<Vec<Member>> {
        select_all_members(self.session())
    }
}

/// Standalone query repository bound to one session.
pub struct MemberQueryRepository<'s> {
    session: &'s Session<'s>,
}

impl<'s> MemberQueryRepository<'s> {
    pub fn try_new(session: &'s Session<'s>) -> RepoResult<Self> {
        ensure_connection_ready(session.connection())?;
        Ok(Self { session })
    }

    pub fn find_all_members(&self) -> RepoResult<Vec<Member>> {
        select_all_members(self.session)
    }
}

fn select_all_members(session: &Session<'_>) -> RepoResult<Vec<Member>> {
    let rows = session.query_map(ALL_MEMBERS_SQL, &[], |row| parse_member_row(row, false))?;
    let mut cache = session.cache_mut();
    Ok(rows
        .into_iter()
        .map(|(member, _)| cache.merge_member(member))
        .collect())
}
