//! `roster` command-line entry point.
//!
//! # Responsibility
//! - Merge TOML config with command-line overrides.
//! - Run each command in one transaction and print its result.
//!
//! # Invariants
//! - Exit code 2 means a requested entity does not exist; any other
//!   failure exits with 1.

mod cli;

use anyhow::{bail, Context};
use clap::Parser;
use cli::{Cli, Command};
use log::info;
use roster_core::{
    init_logging, open_configured, transactional, CoreConfig, CrudRepository, Direction, Member,
    MemberDto, MemberRepository, Page, PageRequest, RepoError, RepoResult, Session, Sort,
    SqliteMemberRepository, SqliteTeamRepository, Team,
};
use std::io::Write;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();
    match run(cli, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}

fn run(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    init_logging(&config.logging)
        .map_err(anyhow::Error::msg)
        .context("failed to initialize logging")?;

    let Some(db_path) = config.database.path.clone() else {
        bail!("no database configured; pass --db or set database.path");
    };
    let mut conn = open_configured(&config.database)
        .with_context(|| format!("failed to open database `{}`", db_path.display()))?;

    match cli.command {
        Command::Seed { count, team } => {
            let seeded =
                transactional(&mut conn, |session| seed(session, count, team)).context("seed failed")?;
            writeln!(out, "seeded {seeded} members")?;
        }
        Command::Show { id } => {
            let member = transactional(&mut conn, |session| {
                SqliteMemberRepository::try_new(session)?.get_by_id(id)
            })?;
            writeln!(out, "{}", member.user_name)?;
        }
        Command::List {
            page,
            size,
            sort,
            desc,
        } => {
            let sort = match sort {
                Some(property) if desc => Sort::by(property, Direction::Desc),
                Some(property) => Sort::asc(property),
                None if desc => Sort::desc("user_name"),
                None => Sort::unsorted(),
            };
            let request = config.paging.request(page, size, sort)?;
            let page = transactional(&mut conn, |session| list_page(session, &request))?;
            let body = serde_json::json!({
                "content": page.content(),
                "number": page.number(),
                "size": page.size(),
                "numberOfElements": page.number_of_elements(),
                "totalElements": page.total_elements(),
                "totalPages": page.total_pages(),
                "first": page.is_first(),
                "last": page.is_last(),
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&body)?)?;
        }
        Command::BulkAgePlus { threshold } => {
            let updated = transactional(&mut conn, |session| {
                SqliteMemberRepository::try_new(session)?.bulk_age_plus(threshold)
            })?;
            writeln!(out, "updated {updated} members")?;
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<CoreConfig> {
    let mut config = match &cli.config {
        Some(path) => CoreConfig::load(path)
            .with_context(|| format!("failed to load config `{}`", path.display()))?,
        None => CoreConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.database.path = Some(db.clone());
    }
    if let Some(dir) = &cli.log_dir {
        config.logging.dir = Some(dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    Ok(config)
}

fn seed(session: &Session<'_>, count: u32, team: Option<String>) -> RepoResult<u32> {
    let teams = SqliteTeamRepository::try_new(session)?;
    let members = SqliteMemberRepository::try_new(session)?;
    let mut team = team.map(|name| teams.save(Team::new(name))).transpose()?;
    for index in 0..count {
        let user_name = format!("user{index}");
        let member = match team.as_mut() {
            Some(team) => Member::with_team(user_name, index, team)?,
            None => Member::with_age(user_name, index),
        };
        members.save(member)?;
    }
    info!("event=seed module=cli status=ok count={count}");
    Ok(count)
}

fn list_page(session: &Session<'_>, request: &PageRequest) -> RepoResult<Page<MemberDto>> {
    let members = SqliteMemberRepository::try_new(session)?;
    let page = members.find_all_paged(request)?;
    let team_names = page
        .content()
        .iter()
        .map(|member| Ok(members.load_team(member)?.map(|team| team.name)))
        .collect::<RepoResult<Vec<_>>>()?;
    let mut team_names = team_names.into_iter();
    Ok(page.map(|member| {
        MemberDto::new(
            member.id.unwrap_or_default(),
            member.user_name,
            team_names.next().flatten(),
        )
    }))
}

fn exit_status(err: &anyhow::Error) -> u8 {
    let not_found = err
        .chain()
        .any(|cause| cause.downcast_ref::<RepoError>().is_some_and(RepoError::is_not_found));
    if not_found {
        2
    } else {
        1
    }
}
