//! Member entity.

use super::team::Team;
use super::{MemberId, ModelValidationError, TeamId};
use serde::{Deserialize, Serialize};

/// A persistent member record.
///
/// `team_id` is the back-reference half of the member/team association; the
/// team side is `Team::member_ids`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Option<MemberId>,
    pub user_name: String,
    pub age: u32,
    pub team_id: Option<TeamId>,
}

impl Member {
    /// Creates an unsaved member with age 0 and no team.
    pub fn new(user_name: impl Into<String>) -> Self {
        Self::with_age(user_name, 0)
    }

    pub fn with_age(user_name: impl Into<String>, age: u32) -> Self {
        Self {
            id: None,
            user_name: user_name.into(),
            age,
            team_id: None,
        }
    }

    /// Creates an unsaved member that already belongs to `team`.
    ///
    /// # Errors
    /// - `ModelValidationError::UnsavedTeam` when `team` has no id yet.
    pub fn with_team(
        user_name: impl Into<String>,
        age: u32,
        team: &mut Team,
    ) -> Result<Self, ModelValidationError> {
        let mut member = Self::with_age(user_name, age);
        member.change_team(team)?;
        Ok(member)
    }

    /// Points this member at `team` and records the membership on the team.
    ///
    /// An unsaved member has no id to record yet; the repository adds it to
    /// the cached team when the member is first inserted.
    pub fn change_team(&mut self, team: &mut Team) -> Result<(), ModelValidationError> {
        let team_id = team.id.ok_or(ModelValidationError::UnsavedTeam)?;
        self.team_id = Some(team_id);
        if let Some(id) = self.id {
            team.add_member_id(id);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.user_name.trim().is_empty() {
            return Err(ModelValidationError::BlankUserName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Member;
    use crate::model::team::Team;
    use crate::model::ModelValidationError;

    #[test]
    fn change_team_requires_saved_team() {
        let mut team = Team::new("teamA");
        let mut member = Member::with_age("member1", 10);

        let err = member.change_team(&mut team).unwrap_err();
        assert_eq!(err, ModelValidationError::UnsavedTeam);
        assert_eq!(member.team_id, None);
    }

    #[test]
    fn change_team_links_both_sides_once() {
        let mut team = Team::new("teamA");
        team.id = Some(7);
        let mut member = Member::with_age("member1", 10);
        member.id = Some(3);

        member.change_team(&mut team).unwrap();
        member.change_team(&mut team).unwrap();

        assert_eq!(member.team_id, Some(7));
        assert_eq!(team.member_ids, vec![3]);
    }

    #[test]
    fn validate_rejects_blank_user_name() {
        assert_eq!(
            Member::new("  ").validate(),
            Err(ModelValidationError::BlankUserName)
        );
        assert!(Member::new("memberA").validate().is_ok());
    }
}
