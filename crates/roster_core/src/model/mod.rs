//! Entity model for the member/team roster.
//!
//! # Responsibility
//! - Define the persistent records (`Member`, `Team`) and the join
//!   projection (`MemberDto`).
//! - Own field-level validation shared by every write path.
//!
//! # Invariants
//! - `id == None` means "never saved"; the store assigns ids on first insert.
//! - A member that names a team appears in that team's `member_ids` once the
//!   association is set through `Member::change_team`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod member;
pub mod member_dto;
pub mod team;

/// Surrogate key of a member row.
pub type MemberId = i64;
/// Surrogate key of a team row.
pub type TeamId = i64;

/// Field-level validation failure raised before any SQL is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    BlankUserName,
    BlankTeamName,
    /// The association target has not been saved yet, so it has no id.
    UnsavedTeam,
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankUserName => write!(f, "member user_name must not be blank"),
            Self::BlankTeamName => write!(f, "team name must not be blank"),
            Self::UnsavedTeam => write!(f, "team must be saved before members can join it"),
        }
    }
}

impl Error for ModelValidationError {}
