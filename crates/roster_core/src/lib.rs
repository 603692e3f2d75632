//! Member/team roster persistence core.
//! Repositories, paging and the transactional identity cache live here;
//! the CLI crate only wires configuration and output.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod session;

pub use config::{ConfigError, CoreConfig, DatabaseConfig, LoggingConfig, PagingConfig};
pub use db::{open_configured, open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::member::Member;
pub use model::member_dto::MemberDto;
pub use model::team::Team;
pub use model::{MemberId, ModelValidationError, TeamId};
pub use query::hints::{FetchMode, LockMode, QueryOptions};
pub use query::page::{Direction, Order, Page, PageRequest, PagingError, Slice, Sort};
pub use query::spec::{MemberField, MemberSpec, Specification};
pub use repo::crud::CrudRepository;
pub use repo::error::{EntityKind, RepoError, RepoResult};
pub use repo::member_query_repo::{MemberCustomRepository, MemberQueryRepository};
pub use repo::member_repo::{MemberRepository, SqliteMemberRepository};
pub use repo::team_repo::{SqliteTeamRepository, TeamRepository};
pub use session::{transactional, Session};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
