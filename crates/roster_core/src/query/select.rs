//! SQL rendering for member queries.
//!
//! # Invariants
//! - Every member select is ordered; unsorted callers get `member_id ASC`.
//! - Placeholders are positional `?` and binds are returned in order.
//! - A predicate on `t.name` always renders an inner join, regardless of
//!   the fetch mode.

use crate::query::hints::{FetchMode, QueryOptions};
use crate::query::page::{Direction, PagingError, Sort};
use crate::query::spec::Specification;
use rusqlite::types::Value;

const MEMBER_COLUMNS: &str = "m.member_id AS member_id,
    m.user_name AS user_name,
    m.age AS age,
    m.team_id AS team_id";

const FETCHED_TEAM_COLUMNS: &str = "t.team_id AS fetched_team_id,
    t.name AS fetched_team_name,
    (SELECT group_concat(x.member_id) FROM members x WHERE x.team_id = t.team_id)
        AS fetched_team_member_ids";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TeamJoin {
    None,
    Left,
    Inner,
}

impl TeamJoin {
    fn sql(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Left => " LEFT JOIN teams t ON t.team_id = m.team_id",
            Self::Inner => " INNER JOIN teams t ON t.team_id = m.team_id",
        }
    }
}

/// Which joins the count statement of a page keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CountQuery {
    /// Same joins as the content statement.
    Derived,
    /// Only the joins the predicate needs.
    Reduced,
}

/// A member select under construction.
#[derive(Debug, Clone)]
pub(crate) struct MemberSelect<'a> {
    spec: &'a Specification,
    options: QueryOptions,
    order_by: Vec<(&'static str, Direction)>,
    limit: Option<u64>,
    offset: u64,
}

impl<'a> MemberSelect<'a> {
    pub(crate) fn new(spec: &'a Specification) -> Self {
        Self {
            spec,
            options: QueryOptions::default(),
            order_by: Vec::new(),
            limit: None,
            offset: 0,
        }
    }

    pub(crate) fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    pub(crate) fn ordered_by(mut self, order_by: Vec<(&'static str, Direction)>) -> Self {
        self.order_by = order_by;
        self
    }

    pub(crate) fn window(mut self, limit: u64, offset: u64) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    pub(crate) fn options(&self) -> QueryOptions {
        self.options
    }

    pub(crate) fn fetches_team(&self) -> bool {
        self.options.fetch == FetchMode::Join
    }

    fn join(&self) -> TeamJoin {
        if self.spec.requires_team_join() {
            TeamJoin::Inner
        } else if self.fetches_team() {
            TeamJoin::Left
        } else {
            TeamJoin::None
        }
    }

    pub(crate) fn to_sql(&self) -> (String, Vec<Value>) {
        let mut binds = Vec::new();
        let mut sql = format!("SELECT {MEMBER_COLUMNS}");
        if self.fetches_team() {
            sql.push_str(",\n    ");
            sql.push_str(FETCHED_TEAM_COLUMNS);
        }
        sql.push_str("\nFROM members m");
        sql.push_str(self.join().sql());
        push_where(&mut sql, &mut binds, self.spec);

        sql.push_str(" ORDER BY ");
        if self.order_by.is_empty() {
            sql.push_str("m.member_id ASC");
        } else {
            let terms = self
                .order_by
                .iter()
                .map(|(column, direction)| format!("{column} {}", direction.sql()))
                .collect::<Vec<_>>();
            sql.push_str(&terms.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            binds.push(Value::Integer(to_sql_int(limit)));
            if self.offset > 0 {
                sql.push_str(" OFFSET ?");
                binds.push(Value::Integer(to_sql_int(self.offset)));
            }
        } else if self.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            binds.push(Value::Integer(to_sql_int(self.offset)));
        }

        sql.push(';');
        (sql, binds)
    }

    pub(crate) fn count_sql(&self, count: CountQuery) -> (String, Vec<Value>) {
        let join = match count {
            CountQuery::Derived => self.join(),
            CountQuery::Reduced if self.spec.requires_team_join() => TeamJoin::Inner,
            CountQuery::Reduced => TeamJoin::None,
        };
        let mut binds = Vec::new();
        let mut sql = String::from("SELECT COUNT(m.member_id) FROM members m");
        sql.push_str(join.sql());
        push_where(&mut sql, &mut binds, self.spec);
        sql.push(';');
        (sql, binds)
    }

    /// `UPDATE members SET {assignments}` over the rows the specification
    /// matches. Joins needed by the predicate stay inside the sub-select.
    pub(crate) fn update_sql(&self, assignments: &str) -> (String, Vec<Value>) {
        let mut binds = Vec::new();
        let mut sql = format!("UPDATE members SET {assignments}");
        if !self.spec.is_empty() {
            sql.push_str(" WHERE member_id IN (SELECT m.member_id FROM members m");
            if self.spec.requires_team_join() {
                sql.push_str(TeamJoin::Inner.sql());
            }
            push_where(&mut sql, &mut binds, self.spec);
            sql.push(')');
        }
        sql.push(';');
        (sql, binds)
    }

    /// No-op write over the matched rows. Running it inside a transaction
    /// takes the SQLite write lock until commit or rollback.
    pub(crate) fn lock_sql(&self) -> (String, Vec<Value>) {
        self.update_sql("member_id = member_id")
    }
}

/// Resolves a caller sort into member columns.
///
/// Unsorted requests order by `user_name ASC`. `member_id ASC` is appended
/// as a tie-breaker unless the caller already ordered by id.
pub(crate) fn member_order_columns(
    sort: &Sort,
) -> Result<Vec<(&'static str, Direction)>, PagingError> {
    let mut columns = Vec::new();
    if sort.is_unsorted() {
        columns.push(("m.user_name", Direction::Asc));
    }
    for order in sort.orders() {
        let column = match order.property.as_str() {
            "id" | "member_id" => "m.member_id",
            "user_name" | "userName" => "m.user_name",
            "age" => "m.age",
            other => {
                return Err(PagingError::UnknownSortProperty {
                    entity: "member",
                    property: other.to_string(),
                })
            }
        };
        columns.push((column, order.direction));
    }
    if !columns.iter().any(|(column, _)| *column == "m.member_id") {
        columns.push(("m.member_id", Direction::Asc));
    }
    Ok(columns)
}

fn push_where(sql: &mut String, binds: &mut Vec<Value>, spec: &Specification) {
    if let Some(predicate) = spec.render(binds) {
        sql.push_str(" WHERE ");
        sql.push_str(&predicate);
    }
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
