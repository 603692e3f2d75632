//! Per-session identity cache.
//!
//! # Invariants
//! - At most one cached instance per id and entity kind.
//! - `merge_*` never replaces an already cached instance.

use crate::model::member::Member;
use crate::model::team::Team;
use crate::model::{MemberId, TeamId};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct EntityCache {
    members: HashMap<MemberId, Member>,
    teams: HashMap<TeamId, Team>,
}

impl EntityCache {
    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.get(&id)
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.get(&id)
    }

    pub fn member_mut(&mut self, id: MemberId) -> Option<&mut Member> {
        self.members.get_mut(&id)
    }

    /// Makes `team_id` the only cached team listing `member_id`.
    pub fn relink_member(&mut self, member_id: MemberId, team_id: Option<TeamId>) {
        for (id, team) in self.teams.iter_mut() {
            if Some(*id) == team_id {
                team.add_member_id(member_id);
            } else {
                team.remove_member_id(member_id);
            }
        }
    }

    /// Inserts or overwrites the cached member. Unsaved members are ignored.
    pub fn put_member(&mut self, member: Member) {
        if let Some(id) = member.id {
            self.members.insert(id, member);
        }
    }

    pub fn put_team(&mut self, team: Team) {
        if let Some(id) = team.id {
            self.teams.insert(id, team);
        }
    }

    /// Returns the managed instance for `member`'s id, registering `member`
    /// when none is cached yet.
    pub fn merge_member(&mut self, member: Member) -> Member {
        let Some(id) = member.id else {
            return member;
        };
        self.members.entry(id).or_insert(member).clone()
    }

    pub fn merge_team(&mut self, team: Team) -> Team {
        let Some(id) = team.id else {
            return team;
        };
        self.teams.entry(id).or_insert(team).clone()
    }

    pub fn evict_member(&mut self, id: MemberId) -> Option<Member> {
        self.members.remove(&id)
    }

    pub fn evict_team(&mut self, id: TeamId) -> Option<Team> {
        self.teams.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len() + self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.teams.clear();
    }
}
