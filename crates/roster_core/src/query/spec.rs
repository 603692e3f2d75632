//! Composable member specifications.
//!
//! # Responsibility
//! - Express finder intent as a small predicate tree (`eq`, `gt`, `ge`,
//!   `lt`, `in`, `and`).
//! - Render the tree into a parameterized SQL fragment.
//!
//! # Invariants
//! - `Specification::none()` renders no `WHERE` clause at all.
//! - `and` with an empty side yields the other side unchanged.
//! - An `in` over an empty set matches no rows.

use rusqlite::types::Value;

/// Member attribute addressable by a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberField {
    Id,
    UserName,
    Age,
    TeamId,
    /// `teams.name` of the associated team; forces an inner join.
    TeamName,
}

impl MemberField {
    pub(crate) fn column(self) -> &'static str {
        match self {
            Self::Id => "m.member_id",
            Self::UserName => "m.user_name",
            Self::Age => "m.age",
            Self::TeamId => "m.team_id",
            Self::TeamName => "t.name",
        }
    }

    fn requires_team_join(self) -> bool {
        matches!(self, Self::TeamName)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Eq(MemberField, Value),
    Gt(MemberField, Value),
    Ge(MemberField, Value),
    Lt(MemberField, Value),
    In(MemberField, Vec<Value>),
    And(Vec<Predicate>),
}

impl Predicate {
    fn requires_team_join(&self) -> bool {
        match self {
            Self::Eq(field, _)
            | Self::Gt(field, _)
            | Self::Ge(field, _)
            | Self::Lt(field, _)
            | Self::In(field, _) => field.requires_team_join(),
            Self::And(parts) => parts.iter().any(Predicate::requires_team_join),
        }
    }

    fn render(&self, sql: &mut String, binds: &mut Vec<Value>) {
        match self {
            Self::Eq(field, value) => push_comparison(sql, binds, *field, "=", value),
            Self::Gt(field, value) => push_comparison(sql, binds, *field, ">", value),
            Self::Ge(field, value) => push_comparison(sql, binds, *field, ">=", value),
            Self::Lt(field, value) => push_comparison(sql, binds, *field, "<", value),
            Self::In(_, values) if values.is_empty() => sql.push_str("0 = 1"),
            Self::In(field, values) => {
                sql.push_str(field.column());
                sql.push_str(" IN (");
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        sql.push_str(", ");
                    }
                    sql.push('?');
                    binds.push(value.clone());
                }
                sql.push(')');
            }
            Self::And(parts) => {
                for (index, part) in parts.iter().enumerate() {
                    if index > 0 {
                        sql.push_str(" AND ");
                    }
                    let nested = matches!(part, Self::And(_));
                    if nested {
                        sql.push('(');
                    }
                    part.render(sql, binds);
                    if nested {
                        sql.push(')');
                    }
                }
            }
        }
    }
}

fn push_comparison(
    sql: &mut String,
    binds: &mut Vec<Value>,
    field: MemberField,
    operator: &str,
    value: &Value,
) {
    sql.push_str(field.column());
    sql.push(' ');
    sql.push_str(operator);
    sql.push_str(" ?");
    binds.push(value.clone());
}

/// A filter over members; possibly empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Specification {
    predicate: Option<Predicate>,
}

impl Specification {
    /// The empty specification: matches every member.
    pub fn none() -> Self {
        Self { predicate: None }
    }

    pub fn eq(field: MemberField, value: impl Into<Value>) -> Self {
        Self::from_predicate(Predicate::Eq(field, value.into()))
    }

    pub fn gt(field: MemberField, value: impl Into<Value>) -> Self {
        Self::from_predicate(Predicate::Gt(field, value.into()))
    }

    pub fn ge(field: MemberField, value: impl Into<Value>) -> Self {
        Self::from_predicate(Predicate::Ge(field, value.into()))
    }

    pub fn lt(field: MemberField, value: impl Into<Value>) -> Self {
        Self::from_predicate(Predicate::Lt(field, value.into()))
    }

    pub fn in_list<I, V>(field: MemberField, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::from_predicate(Predicate::In(
            field,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Conjunction. Flattens nested `and` chains.
    pub fn and(self, other: Specification) -> Self {
        let predicate = match (self.predicate, other.predicate) {
            (None, None) => None,
            (Some(only), None) | (None, Some(only)) => Some(only),
            (Some(Predicate::And(mut left)), Some(Predicate::And(right))) => {
                left.extend(right);
                Some(Predicate::And(left))
            }
            (Some(Predicate::And(mut left)), Some(right)) => {
                left.push(right);
                Some(Predicate::And(left))
            }
            (Some(left), Some(Predicate::And(right))) => {
                let mut parts = Vec::with_capacity(right.len() + 1);
                parts.push(left);
                parts.extend(right);
                Some(Predicate::And(parts))
            }
            (Some(left), Some(right)) => Some(Predicate::And(vec![left, right])),
        };
        Self { predicate }
    }

    pub fn is_empty(&self) -> bool {
        self.predicate.is_none()
    }

    pub(crate) fn requires_team_join(&self) -> bool {
        self.predicate
            .as_ref()
            .is_some_and(Predicate::requires_team_join)
    }

    /// Renders the `WHERE` body (without the keyword), appending binds in
    /// placeholder order. Returns `None` for the empty specification.
    pub(crate) fn render(&self, binds: &mut Vec<Value>) -> Option<String> {
        let predicate = self.predicate.as_ref()?;
        let mut sql = String::new();
        predicate.render(&mut sql, binds);
        Some(sql)
    }

    fn from_predicate(predicate: Predicate) -> Self {
        Self {
            predicate: Some(predicate),
        }
    }
}

/// Named member specifications.
pub struct MemberSpec;

impl MemberSpec {
    pub fn user_name(user_name: &str) -> Specification {
        Specification::eq(MemberField::UserName, user_name.to_string())
    }

    /// Matches members whose team is named `team_name`.
    ///
    /// An empty `team_name` yields the empty specification.
    pub fn team_name(team_name: &str) -> Specification {
        if team_name.is_empty() {
            return Specification::none();
        }
        Specification::eq(MemberField::TeamName, team_name.to_string())
    }

    pub fn age_greater_than(age: u32) -> Specification {
        Specification::gt(MemberField::Age, i64::from(age))
    }

    pub fn age_at_least(age: u32) -> Specification {
        Specification::ge(MemberField::Age, i64::from(age))
    }

    pub fn age_below(age: u32) -> Specification {
        Specification::lt(MemberField::Age, i64::from(age))
    }

    pub fn age(age: u32) -> Specification {
        Specification::eq(MemberField::Age, i64::from(age))
    }

    pub fn id(id: i64) -> Specification {
        Specification::eq(MemberField::Id, id)
    }

    pub fn user_name_in(names: &[String]) -> Specification {
        Specification::in_list(MemberField::UserName, names.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemberField, MemberSpec, Specification};
    use rusqlite::types::Value;

    fn rendered(spec: &Specification) -> (Option<String>, Vec<Value>) {
        let mut binds = Vec::new();
        let sql = spec.render(&mut binds);
        (sql, binds)
    }

    #[test]
    fn empty_specification_renders_nothing() {
        let (sql, binds) = rendered(&Specification::none());
        assert_eq!(sql, None);
        assert!(binds.is_empty());
    }

    #[test]
    fn and_chains_flatten_in_order() {
        let spec = MemberSpec::user_name("AAA")
            .and(MemberSpec::age_greater_than(10))
            .and(MemberSpec::age(20));
        let (sql, binds) = rendered(&spec);
        assert_eq!(
            sql.as_deref(),
            Some("m.user_name = ? AND m.age > ? AND m.age = ?")
        );
        assert_eq!(
            binds,
            vec![
                Value::Text("AAA".to_string()),
                Value::Integer(10),
                Value::Integer(20)
            ]
        );
    }

    #[test]
    fn empty_team_name_short_circuits() {
        let spec = MemberSpec::user_name("m1").and(MemberSpec::team_name(""));
        assert!(!spec.requires_team_join());
        let (sql, _) = rendered(&spec);
        assert_eq!(sql.as_deref(), Some("m.user_name = ?"));
    }

    #[test]
    fn team_name_requires_join() {
        let spec = MemberSpec::team_name("teamA").and(Specification::none());
        assert!(spec.requires_team_join());
        let (sql, _) = rendered(&spec);
        assert_eq!(sql.as_deref(), Some("t.name = ?"));
    }

    #[test]
    fn in_list_renders_one_placeholder_per_value() {
        let names = vec!["AAA".to_string(), "BBB".to_string()];
        let (sql, binds) = rendered(&MemberSpec::user_name_in(&names));
        assert_eq!(sql.as_deref(), Some("m.user_name IN (?, ?)"));
        assert_eq!(binds.len(), 2);
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let (sql, binds) = rendered(&Specification::in_list(
            MemberField::UserName,
            Vec::<String>::new(),
        ));
        assert_eq!(sql.as_deref(), Some("0 = 1"));
        assert!(binds.is_empty());
    }

    #[test]
    fn age_window_renders_lower_and_upper_bound() {
        let spec = MemberSpec::age_at_least(20).and(MemberSpec::age_below(u32::MAX));
        let (sql, binds) = rendered(&spec);
        assert_eq!(sql.as_deref(), Some("m.age >= ? AND m.age < ?"));
        assert_eq!(
            binds,
            vec![Value::Integer(20), Value::Integer(i64::from(u32::MAX))]
        );
    }
}
