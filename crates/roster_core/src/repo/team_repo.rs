//! Team repository contract and SQLite implementation.
//!
//! # Invariants
//! - `Team::member_ids` is always read from `members.team_id`, never stored.
//!   `save` writes the name only and keeps the membership it already knows.
//! - Deleting a team that still has members fails with the store's
//!   foreign-key error.

use crate::model::team::Team;
use crate::model::TeamId;
use crate::query::page::{Direction, Page, PageRequest, PagingError, Sort};
use crate::repo::crud::CrudRepository;
use crate::repo::error::{EntityKind, RepoError, RepoResult};
use crate::repo::{ensure_connection_ready, page_total, parse_id_list, single_result};
use crate::session::Session;
use log::debug;
use rusqlite::types::Value;
use rusqlite::Row;

const TEAM_SELECT_SQL: &str = "SELECT
    t.team_id AS team_id,
    t.name AS name,
    (SELECT group_concat(x.member_id) FROM members x WHERE x.team_id = t.team_id)
        AS member_ids
FROM teams t";

/// Repository interface for teams.
pub trait TeamRepository: CrudRepository<Entity = Team, Id = TeamId> {
    /// Single-result lookup by exact name.
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Team>>;
}

/// SQLite-backed team repository bound to one session.
pub struct SqliteTeamRepository<'s> {
    session: &'s Session<'s>,
}

impl<'s> SqliteTeamRepository<'s> {
    pub fn try_new(session: &'s Session<'s>) -> RepoResult<Self> {
        ensure_connection_ready(session.connection())?;
        Ok(Self { session })
    }

    fn select(&self, where_sql: Option<&str>, binds: &[Value], tail: &str) -> RepoResult<Vec<Team>> {
        let mut sql = String::from(TEAM_SELECT_SQL);
        if let Some(where_sql) = where_sql {
            sql.push_str(" WHERE ");
            sql.push_str(where_sql);
        }
        sql.push(' ');
        sql.push_str(tail);
        let rows = self.session.query_map(&sql, binds, parse_team_row)?;
        let mut cache = self.session.cache_mut();
        Ok(rows.into_iter().map(|team| cache.merge_team(team)).collect())
    }

    fn stored_member_ids(&self, id: TeamId) -> RepoResult<Vec<i64>> {
        let mut rows = self.session.query_map(
            "SELECT group_concat(member_id) FROM members WHERE team_id = ?1;",
            &[Value::Integer(id)],
            |row| Ok::<_, RepoError>(row.get::<_, Option<String>>(0)?),
        )?;
        parse_id_list(rows.pop().flatten(), "members.team_id")
    }
}

impl CrudRepository for SqliteTeamRepository<'_> {
    type Entity = Team;
    type Id = TeamId;

    const KIND: EntityKind = EntityKind::Team;

    fn save(&self, mut team: Team) -> RepoResult<Team> {
        team.validate()?;

        match team.id {
            None => {
                self.session.execute(
                    "INSERT INTO teams (name) VALUES (?1);",
                    &[Value::Text(team.name.clone())],
                )?;
                team.id = Some(self.session.last_insert_rowid());
                team.member_ids.clear();
            }
            Some(id) => {
                let cached = self
                    .session
                    .cache()
                    .team(id)
                    .map(|cached| (cached.name.clone(), cached.member_ids.clone()));
                if let Some((name, member_ids)) = &cached {
                    if *name == team.name {
                        team.member_ids.clone_from(member_ids);
                        debug!("event=team_save module=repo status=ok dirty=false");
                        return Ok(team);
                    }
                }
                let changed = self.session.execute(
                    "UPDATE teams SET name = ?1 WHERE team_id = ?2;",
                    &[Value::Text(team.name.clone()), Value::Integer(id)],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound {
                        entity: EntityKind::Team,
                        id,
                    });
                }
                team.member_ids = match cached {
                    Some((_, member_ids)) => member_ids,
                    None => self.stored_member_ids(id)?,
                };
            }
        }

        self.session.cache_mut().put_team(team.clone());
        Ok(team)
    }

    fn find_by_id(&self, id: TeamId) -> RepoResult<Option<Team>> {
        load_team(self.session, id)
    }

    fn find_all(&self) -> RepoResult<Vec<Team>> {
        self.select(None, &[], "ORDER BY t.team_id ASC;")
    }

    fn find_all_paged(&self, request: &PageRequest) -> RepoResult<Page<Team>> {
        let order_by = team_order_sql(request.sort())?;
        let tail = format!("ORDER BY {order_by} LIMIT ? OFFSET ?;");
        let binds = [
            Value::Integer(i64::from(request.size())),
            Value::Integer(i64::try_from(request.offset()).unwrap_or(i64::MAX)),
        ];
        let content = self.select(None, &binds, &tail)?;
        let total = page_total(request, content.len(), || self.count())?;
        Ok(Page::new(content, request, total))
    }

    fn count(&self) -> RepoResult<u64> {
        Ok(self
            .session
            .query_count("SELECT COUNT(*) FROM teams;", &[])?)
    }

    fn delete(&self, team: &Team) -> RepoResult<()> {
        let Some(id) = team.id else {
            return Ok(());
        };
        self.session
            .execute("DELETE FROM teams WHERE team_id = ?1;", &[Value::Integer(id)])?;
        self.session.cache_mut().evict_team(id);
        Ok(())
    }

    fn delete_by_id(&self, id: TeamId) -> RepoResult<()> {
        let changed = self
            .session
            .execute("DELETE FROM teams WHERE team_id = ?1;", &[Value::Integer(id)])?;
        self.session.cache_mut().evict_team(id);
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Team,
                id,
            });
        }
        Ok(())
    }
}

impl TeamRepository for SqliteTeamRepository<'_> {
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Team>> {
        let teams = self.select(
            Some("t.name = ?"),
            &[Value::Text(name.to_string())],
            "ORDER BY t.team_id ASC;",
        )?;
        single_result("find_by_name", teams)
    }
}

/// Loads one team through the session cache, issuing at most one statement.
pub(crate) fn load_team(session: &Session<'_>, id: TeamId) -> RepoResult<Option<Team>> {
    if let Some(team) = session.cache().team(id) {
        return Ok(Some(team.clone()));
    }

    let sql = format!("{TEAM_SELECT_SQL} WHERE t.team_id = ?;");
    let mut rows = session.query_map(&sql, &[Value::Integer(id)], parse_team_row)?;
    match rows.pop() {
        Some(team) => Ok(Some(session.cache_mut().merge_team(team))),
        None => Ok(None),
    }
}

fn parse_team_row(row: &Row<'_>) -> RepoResult<Team> {
    let team = Team {
        id: Some(row.get("team_id")?),
        name: row.get("name")?,
        member_ids: parse_id_list(row.get("member_ids")?, "members.team_id")?,
    };
    team.validate()
        .map_err(|err| RepoError::InvalidData(format!("{err} in teams.name")))?;
    Ok(team)
}

fn team_order_sql(sort: &Sort) -> RepoResult<String> {
    let mut terms = Vec::new();
    let mut has_id = false;
    for order in sort.orders() {
        let column = match order.property.as_str() {
            "id" | "team_id" => {
                has_id = true;
                "t.team_id"
            }
            "name" => "t.name",
            other => {
                return Err(PagingError::UnknownSortProperty {
                    entity: "team",
                    property: other.to_string(),
                }
                .into())
            }
        };
        terms.push(format!("{column} {}", order.direction.sql()));
    }
    if !has_id {
        terms.push(format!("t.team_id {}", Direction::Asc.sql()));
    }
    Ok(terms.join(", "))
}
