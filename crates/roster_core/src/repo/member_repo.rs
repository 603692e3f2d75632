//! Member repository contract and SQLite implementation.
//!
//! # Responsibility
//! - CRUD and paging over `members`.
//! - Derived finders expressed as `Specification`s.
//! - Association access (`load_team`), fetch joins, bulk updates and
//!   pessimistic locking.
//!
//! # Invariants
//! - Finder results are merged into the session cache; a cached instance
//!   wins over the fetched row unless the finder is read-only.
//! - `bulk_age_plus` clears the session cache before returning.
//! - Lazy finders followed by `load_team` cost one statement per uncached
//!   team (N+1). Prefer the fetch-join finders when teams are needed.

use crate::model::member::Member;
use crate::model::member_dto::MemberDto;
use crate::model::team::Team;
use crate::model::{MemberId, TeamId};
use crate::query::hints::{LockMode, QueryOptions};
use crate::query::page::{Page, PageRequest, Slice};
use crate::query::select::{member_order_columns, CountQuery, MemberSelect};
use crate::query::spec::{MemberSpec, Specification};
use crate::repo::crud::CrudRepository;
use crate::repo::error::{EntityKind, RepoError, RepoResult};
use crate::repo::team_repo::load_team;
use crate::repo::{ensure_connection_ready, page_total, parse_id_list, single_result};
use crate::session::Session;
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::Row;

/// Repository interface for members.
pub trait MemberRepository: CrudRepository<Entity = Member, Id = MemberId> {
    /// `user_name = ? AND age > ?`.
    fn find_by_user_name_and_age_greater_than(
        &self,
        user_name: &str,
        age: u32,
    ) -> RepoResult<Vec<Member>>;
    fn find_by_user_name(&self, user_name: &str) -> RepoResult<Vec<Member>>;
    /// Collection contract of the by-name lookup.
    fn find_list_by_user_name(&self, user_name: &str) -> RepoResult<Vec<Member>>;
    /// `user_name = ? AND age = ?`.
    fn find_user(&self, user_name: &str, age: u32) -> RepoResult<Vec<Member>>;
    /// User names only, in id order.
    fn find_user_name_list(&self) -> RepoResult<Vec<String>>;
    /// Members with a team, projected through an inner join.
    fn find_member_dto(&self) -> RepoResult<Vec<MemberDto>>;
    /// `user_name IN (...)`. An empty set matches nothing.
    fn find_by_names(&self, names: &[String]) -> RepoResult<Vec<Member>>;
    /// Single result; `None` stands for the nullable contract.
    fn find_member_by_user_name(&self, user_name: &str) -> RepoResult<Option<Member>>;
    /// Single result with the explicit optional contract.
    fn find_optional_by_user_name(&self, user_name: &str) -> RepoResult<Option<Member>>;
    fn find_by_age(&self, age: u32, request: &PageRequest) -> RepoResult<Page<Member>>;
    fn find_slice_by_age(&self, age: u32, request: &PageRequest) -> RepoResult<Slice<Member>>;
    /// The page window as a plain list; no count statement.
    fn find_list_by_age(&self, age: u32, request: &PageRequest) -> RepoResult<Vec<Member>>;
    /// Page over members left-joined with their team, counted without the
    /// join.
    fn find_by_age_with_team(&self, age: u32, request: &PageRequest)
        -> RepoResult<Page<Member>>;
    /// `age = age + 1` for every member with `age >= threshold`, in one
    /// statement. Members already at `u32::MAX` are skipped. Returns the
    /// number of updated rows.
    fn bulk_age_plus(&self, threshold: u32) -> RepoResult<usize>;
    /// All members with their teams fetched in the same statement.
    fn find_member_fetch_join(&self) -> RepoResult<Vec<Member>>;
    /// Same rows as `find_member_fetch_join`, for callers that only name the
    /// association to fetch.
    fn find_member_entity_graph(&self) -> RepoResult<Vec<Member>>;
    fn find_entity_graph_by_user_name(&self, user_name: &str) -> RepoResult<Vec<Member>>;
    /// Single result that bypasses the identity cache.
    fn find_read_only_by_user_name(&self, user_name: &str) -> RepoResult<Option<Member>>;
    /// Matching members, write-locked until the session ends.
    fn find_lock_by_user_name(&self, user_name: &str) -> RepoResult<Vec<Member>>;
    fn find_all_by_spec(&self, spec: &Specification) -> RepoResult<Vec<Member>>;
    fn find_all_by_spec_paged(
        &self,
        spec: &Specification,
        request: &PageRequest,
    ) -> RepoResult<Page<Member>>;
    /// Moves `member` to `team`, updating the row and both in-memory sides.
    fn change_team(&self, member: &mut Member, team: &mut Team) -> RepoResult<()>;
    /// The member's team: cached, or fetched with one statement.
    fn load_team(&self, member: &Member) -> RepoResult<Option<Team>>;
}

/// SQLite-backed member repository bound to one session.
pub struct SqliteMemberRepository<'s> {
    session: &'s Session<'s>,
}

impl<'s> SqliteMemberRepository<'s> {
    pub fn try_new(session: &'s Session<'s>) -> RepoResult<Self> {
        ensure_connection_ready(session.connection())?;
        Ok(Self { session })
    }

    pub(crate) fn session(&self) -> &'s Session<'s> {
        self.session
    }

    fn select(&self, select: &MemberSelect<'_>) -> RepoResult<Vec<Member>> {
        let options = select.options();
        if options.lock == LockMode::PessimisticWrite {
            let (lock_sql, lock_binds) = select.lock_sql();
            let locked = self.session.execute(&lock_sql, &lock_binds)?;
            debug!("event=member_lock module=repo status=ok rows={locked}");
        }

        let (sql, binds) = select.to_sql();
        let fetch_team = select.fetches_team();
        let rows = self
            .session
            .query_map(&sql, &binds, |row| parse_member_row(row, fetch_team))?;

        if options.read_only {
            return Ok(rows.into_iter().map(|(member, _)| member).collect());
        }

        let mut cache = self.session.cache_mut();
        let members = rows
            .into_iter()
            .map(|(member, team)| {
                if let Some(team) = team {
                    cache.merge_team(team);
                }
                cache.merge_member(member)
            })
            .collect();
        Ok(members)
    }

    fn find_where(&self, spec: &Specification, options: QueryOptions) -> RepoResult<Vec<Member>> {
        self.select(&MemberSelect::new(spec).with_options(options))
    }

    fn page(
        &self,
        spec: &Specification,
        options: QueryOptions,
        request: &PageRequest,
        count: CountQuery,
    ) -> RepoResult<Page<Member>> {
        let select = MemberSelect::new(spec)
            .with_options(options)
            .ordered_by(member_order_columns(request.sort())?)
            .window(u64::from(request.size()), request.offset());
        let content = self.select(&select)?;
        let total = page_total(request, content.len(), || {
            let (sql, binds) = select.count_sql(count);
            Ok(self.session.query_count(&sql, &binds)?)
        })?;
        Ok(Page::new(content, request, total))
    }

    fn window(&self, spec: &Specification, request: &PageRequest, extra: u64) -> RepoResult<Vec<Member>> {
        let select = MemberSelect::new(spec)
            .ordered_by(member_order_columns(request.sort())?)
            .window(u64::from(request.size()) + extra, request.offset());
        self.select(&select)
    }
}

impl CrudRepository for SqliteMemberRepository<'_> {
    type Entity = Member;
    type Id = MemberId;

    const KIND: EntityKind = EntityKind::Member;

    fn save(&self, mut member: Member) -> RepoResult<Member> {
        member.validate()?;

        match member.id {
            None => {
                self.session.execute(
                    "INSERT INTO members (user_name, age, team_id) VALUES (?1, ?2, ?3);",
                    &[
                        Value::Text(member.user_name.clone()),
                        Value::Integer(i64::from(member.age)),
                        member.team_id.map_or(Value::Null, Value::Integer),
                    ],
                )?;
                member.id = Some(self.session.last_insert_rowid());
            }
            Some(id) => {
                if self.session.cache().member(id) == Some(&member) {
                    debug!("event=member_save module=repo status=ok dirty=false");
                    return Ok(member);
                }
                let changed = self.session.execute(
                    "UPDATE members SET user_name = ?1, age = ?2, team_id = ?3 WHERE member_id = ?4;",
                    &[
                        Value::Text(member.user_name.clone()),
                        Value::Integer(i64::from(member.age)),
                        member.team_id.map_or(Value::Null, Value::Integer),
                        Value::Integer(id),
                    ],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound {
                        entity: EntityKind::Member,
                        id,
                    });
                }
            }
        }

        let mut cache = self.session.cache_mut();
        if let Some(id) = member.id {
            cache.relink_member(id, member.team_id);
        }
        cache.put_member(member.clone());
        Ok(member)
    }

    fn find_by_id(&self, id: MemberId) -> RepoResult<Option<Member>> {
        if let Some(member) = self.session.cache().member(id) {
            return Ok(Some(member.clone()));
        }
        let members = self.find_where(&MemberSpec::id(id), QueryOptions::default())?;
        single_result("find_by_id", members)
    }

    fn find_all(&self) -> RepoResult<Vec<Member>> {
        self.find_where(&Specification::none(), QueryOptions::default())
    }

    fn find_all_paged(&self, request: &PageRequest) -> RepoResult<Page<Member>> {
        self.page(
            &Specification::none(),
            QueryOptions::default(),
            request,
            CountQuery::Derived,
        )
    }

    fn count(&self) -> RepoResult<u64> {
        Ok(self
            .session
            .query_count("SELECT COUNT(*) FROM members;", &[])?)
    }

    fn delete(&self, member: &Member) -> RepoResult<()> {
        let Some(id) = member.id else {
            return Ok(());
        };
        self.session
            .execute("DELETE FROM members WHERE member_id = ?1;", &[Value::Integer(id)])?;
        let mut cache = self.session.cache_mut();
        cache.evict_member(id);
        cache.relink_member(id, None);
        Ok(())
    }

    fn delete_by_id(&self, id: MemberId) -> RepoResult<()> {
        let changed = self
            .session
            .execute("DELETE FROM members WHERE member_id = ?1;", &[Value::Integer(id)])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Member,
                id,
            });
        }
        let mut cache = self.session.cache_mut();
        cache.evict_member(id);
        cache.relink_member(id, None);
        Ok(())
    }
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn find_by_user_name_and_age_greater_than(
        &self,
        user_name: &str,
        age: u32,
    ) -> RepoResult<Vec<Member>> {
        let spec = MemberSpec::user_name(user_name).and(MemberSpec::age_greater_than(age));
        self.find_where(&spec, QueryOptions::default())
    }

    fn find_by_user_name(&self, user_name: &str) -> RepoResult<Vec<Member>> {
        self.find_where(&MemberSpec::user_name(user_name), QueryOptions::default())
    }

    fn find_list_by_user_name(&self, user_name: &str) -> RepoResult<Vec<Member>> {
        self.find_by_user_name(user_name)
    }

    fn find_user(&self, user_name: &str, age: u32) -> RepoResult<Vec<Member>> {
        let spec = MemberSpec::user_name(user_name).and(MemberSpec::age(age));
        self.find_where(&spec, QueryOptions::default())
    }

    fn find_user_name_list(&self) -> RepoResult<Vec<String>> {
        self.session.query_map(
            "SELECT m.user_name FROM members m ORDER BY m.member_id ASC;",
            &[],
            |row| Ok::<_, RepoError>(row.get(0)?),
        )
    }

    fn find_member_dto(&self) -> RepoResult<Vec<MemberDto>> {
        self.session.query_map(
            "SELECT m.member_id, m.user_name, t.name
             FROM members m
             INNER JOIN teams t ON t.team_id = m.team_id
             ORDER BY m.member_id ASC;",
            &[],
            |row| {
                Ok::<_, RepoError>(MemberDto::new(
                    row.get(0)?,
                    row.get::<_, String>(1)?,
                    Some(row.get(2)?),
                ))
            },
        )
    }

    fn find_by_names(&self, names: &[String]) -> RepoResult<Vec<Member>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        self.find_where(&MemberSpec::user_name_in(names), QueryOptions::default())
    }

    fn find_member_by_user_name(&self, user_name: &str) -> RepoResult<Option<Member>> {
        let members = self.find_by_user_name(user_name)?;
        single_result("find_member_by_user_name", members)
    }

    fn find_optional_by_user_name(&self, user_name: &str) -> RepoResult<Option<Member>> {
        let members = self.find_by_user_name(user_name)?;
        single_result("find_optional_by_user_name", members)
    }

    fn find_by_age(&self, age: u32, request: &PageRequest) -> RepoResult<Page<Member>> {
        self.page(
            &MemberSpec::age(age),
            QueryOptions::default(),
            request,
            CountQuery::Derived,
        )
    }

    fn find_slice_by_age(&self, age: u32, request: &PageRequest) -> RepoResult<Slice<Member>> {
        let rows = self.window(&MemberSpec::age(age), request, 1)?;
        Ok(Slice::from_lookahead(rows, request))
    }

    fn find_list_by_age(&self, age: u32, request: &PageRequest) -> RepoResult<Vec<Member>> {
        self.window(&MemberSpec::age(age), request, 0)
    }

    fn find_by_age_with_team(
        &self,
        age: u32,
        request: &PageRequest,
    ) -> RepoResult<Page<Member>> {
        self.page(
            &MemberSpec::age(age),
            QueryOptions::fetch_join(),
            request,
            CountQuery::Reduced,
        )
    }

    fn bulk_age_plus(&self, threshold: u32) -> RepoResult<usize> {
        // Ages already at the `u32` ceiling are left alone.
        let spec = MemberSpec::age_at_least(threshold).and(MemberSpec::age_below(u32::MAX));
        let (sql, binds) = MemberSelect::new(&spec).update_sql("age = age + 1");
        let updated = self.session.execute(&sql, &binds)?;
        self.session.clear();
        info!("event=bulk_update module=repo status=ok op=age_plus threshold={threshold} rows={updated}");
        Ok(updated)
    }

    fn find_member_fetch_join(&self) -> RepoResult<Vec<Member>> {
        self.find_where(&Specification::none(), QueryOptions::fetch_join())
    }

    fn find_member_entity_graph(&self) -> RepoResult<Vec<Member>> {
        self.find_where(&Specification::none(), QueryOptions::fetch_join())
    }

    fn find_entity_graph_by_user_name(&self, user_name: &str) -> RepoResult<Vec<Member>> {
        self.find_where(&MemberSpec::user_name(user_name), QueryOptions::fetch_join())
    }

    fn find_read_only_by_user_name(&self, user_name: &str) -> RepoResult<Option<Member>> {
        let members = self.find_where(&MemberSpec::user_name(user_name), QueryOptions::read_only())?;
        single_result("find_read_only_by_user_name", members)
    }

    fn find_lock_by_user_name(&self, user_name: &str) -> RepoResult<Vec<Member>> {
        self.find_where(
            &MemberSpec::user_name(user_name),
            QueryOptions::pessimistic_write(),
        )
    }

    fn find_all_by_spec(&self, spec: &Specification) -> RepoResult<Vec<Member>> {
        self.find_where(spec, QueryOptions::default())
    }

    fn find_all_by_spec_paged(
        &self,
        spec: &Specification,
        request: &PageRequest,
    ) -> RepoResult<Page<Member>> {
        self.page(spec, QueryOptions::default(), request, CountQuery::Derived)
    }

    fn change_team(&self, member: &mut Member, team: &mut Team) -> RepoResult<()> {
        let member_id = member.id.ok_or(RepoError::Unsaved(EntityKind::Member))?;
        let team_id = team.id.ok_or(RepoError::Unsaved(EntityKind::Team))?;

        let changed = self.session.execute(
            "UPDATE members SET team_id = ?1 WHERE member_id = ?2;",
            &[Value::Integer(team_id), Value::Integer(member_id)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Member,
                id: member_id,
            });
        }

        member.change_team(team)?;
        let mut cache = self.session.cache_mut();
        cache.relink_member(member_id, Some(team_id));
        if let Some(cached) = cache.team(team_id) {
            team.member_ids.clone_from(&cached.member_ids);
        }
        // Only the association is flushed here; other pending edits on
        // `member` stay dirty for the next `save`.
        if let Some(cached) = cache.member_mut(member_id) {
            cached.team_id = Some(team_id);
        }
        Ok(())
    }

    fn load_team(&self, member: &Member) -> RepoResult<Option<Team>> {
        match member.team_id {
            Some(team_id) => load_team(self.session, team_id),
            None => Ok(None),
        }
    }
}

pub(crate) fn parse_member_row(row: &Row<'_>, fetch_team: bool) -> RepoResult<(Member, Option<Team>)> {
    let age: i64 = row.get("age")?;
    let age = u32::try_from(age)
        .map_err(|_| RepoError::InvalidData(format!("invalid age `{age}` in members.age")))?;
    let member = Member {
        id: Some(row.get("member_id")?),
        user_name: row.get("user_name")?,
        age,
        team_id: row.get("team_id")?,
    };
    member
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("{err} in members.user_name")))?;

    if !fetch_team {
        return Ok((member, None));
    }

    let team = match row.get::<_, Option<TeamId>>("fetched_team_id")? {
        Some(team_id) => Some(Team {
            id: Some(team_id),
            name: row.get("fetched_team_name")?,
            member_ids: parse_id_list(row.get("fetched_team_member_ids")?, "members.team_id")?,
        }),
        None => None,
    };
    Ok((member, team))
}
