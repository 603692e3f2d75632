//! Team entity.

use super::{MemberId, ModelValidationError, TeamId};
use serde::{Deserialize, Serialize};

/// A persistent team record.
///
/// `member_ids` is materialized from `members.team_id` whenever a team is
/// loaded and kept sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: Option<TeamId>,
    pub name: String,
    pub member_ids: Vec<MemberId>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            member_ids: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.name.trim().is_empty() {
            return Err(ModelValidationError::BlankTeamName);
        }
        Ok(())
    }

    pub fn has_member(&self, member_id: MemberId) -> bool {
        self.member_ids.binary_search(&member_id).is_ok()
    }

    pub(crate) fn add_member_id(&mut self, member_id: MemberId) {
        if let Err(index) = self.member_ids.binary_search(&member_id) {
            self.member_ids.insert(index, member_id);
        }
    }

    pub(crate) fn remove_member_id(&mut self, member_id: MemberId) {
        if let Ok(index) = self.member_ids.binary_search(&member_id) {
            self.member_ids.remove(index);
        }
    }
}
