use roster_core::db::open_db_in_memory;
use roster_core::{
    CrudRepository, DbError, EntityKind, Member, MemberRepository, ModelValidationError,
    PageRequest, RepoError, Session, Sort, SqliteMemberRepository, SqliteTeamRepository, Team,
    TeamRepository,
};
use rusqlite::ErrorCode;

#[test]
fn team_crud_and_find_by_name() {
    let mut conn = open_db_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();
    let teams = SqliteTeamRepository::try_new(&session).unwrap();

    let team_a = teams.save(Team::new("teamA")).unwrap();
    teams.save(Team::new("teamB")).unwrap();
    assert_eq!(teams.count().unwrap(), 2);

    session.clear();
    assert_eq!(teams.find_by_name("teamA").unwrap(), Some(team_a.clone()));
    assert_eq!(teams.find_by_name("teamZ").unwrap(), None);

    let mut renamed = team_a.clone();
    renamed.name = "teamAlpha".to_string();
    teams.save(renamed).unwrap();
    session.clear();
    assert_eq!(
        teams.get_by_id(team_a.id.unwrap()).unwrap().name,
        "teamAlpha"
    );

    teams.delete(&team_a).unwrap();
    assert_eq!(teams.count().unwrap(), 1);
    assert!(teams.delete_by_id(team_a.id.unwrap()).unwrap_err().is_not_found());
}

#[test]
fn blank_team_name_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();
    let teams = SqliteTeamRepository::try_new(&session).unwrap();

    let err = teams.save(Team::new("")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::BlankTeamName)
    ));
}

#[test]
fn deleting_team_with_members_fails_with_constraint_error() {
    let mut conn = open_db_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();
    let teams = SqliteTeamRepository::try_new(&session).unwrap();
    let members = SqliteMemberRepository::try_new(&session).unwrap();

    let mut team = teams.save(Team::new("teamA")).unwrap();
    members
        .save(Member::with_team("member1", 10, &mut team).unwrap())
        .unwrap();

    match teams.delete(&team).unwrap_err() {
        RepoError::Db(err @ DbError::Sqlite(_)) => {
            assert_eq!(err.sqlite_code(), Some(ErrorCode::ConstraintViolation));
            assert!(err.is_constraint_violation());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(teams.count().unwrap(), 1);
}

#[test]
fn member_ids_are_read_from_member_rows() {
    let mut conn = open_db_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();
    let teams = SqliteTeamRepository::try_new(&session).unwrap();
    let members = SqliteMemberRepository::try_new(&session).unwrap();

    let mut team = teams.save(Team::new("teamA")).unwrap();
    let m1 = members
        .save(Member::with_team("member1", 10, &mut team).unwrap())
        .unwrap();
    let m2 = members
        .save(Member::with_team("member2", 20, &mut team).unwrap())
        .unwrap();

    let cached = teams.get_by_id(team.id.unwrap()).unwrap();
    assert_eq!(cached.member_ids, vec![m1.id.unwrap(), m2.id.unwrap()]);

    session.clear();
    let loaded = teams.get_by_id(team.id.unwrap()).unwrap();
    assert_eq!(loaded.member_ids, vec![m1.id.unwrap(), m2.id.unwrap()]);
    assert!(loaded.has_member(m2.id.unwrap()));
}

#[test]
fn renaming_team_keeps_its_members() {
    let mut conn = open_db_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();
    let teams = SqliteTeamRepository::try_new(&session).unwrap();
    let members = SqliteMemberRepository::try_new(&session).unwrap();

    let mut team = teams.save(Team::new("teamA")).unwrap();
    let member = members
        .save(Member::with_team("member1", 10, &mut team).unwrap())
        .unwrap();
    let member_id = member.id.unwrap();
    assert!(team.member_ids.is_empty());

    team.name = "teamB".to_string();
    let renamed = teams.save(team.clone()).unwrap();
    assert_eq!(renamed.member_ids, vec![member_id]);

    let loaded = members.load_team(&member).unwrap().unwrap();
    assert_eq!(loaded.name, "teamB");
    assert_eq!(loaded.member_ids, vec![member_id]);

    session.clear();
    let stale = Team {
        id: team.id,
        name: "teamC".to_string(),
        member_ids: Vec::new(),
    };
    let saved = teams.save(stale).unwrap();
    assert_eq!(saved.member_ids, vec![member_id]);
    assert_eq!(
        members.load_team(&member).unwrap().unwrap().member_ids,
        vec![member_id]
    );
}

#[test]
fn team_dirty_check_ignores_stale_member_ids() {
    let mut conn = open_db_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();
    let teams = SqliteTeamRepository::try_new(&session).unwrap();
    let members = SqliteMemberRepository::try_new(&session).unwrap();

    let mut team = teams.save(Team::new("teamA")).unwrap();
    let member = members
        .save(Member::with_team("member1", 10, &mut team).unwrap())
        .unwrap();

    let before = session.statement_count();
    let unchanged = teams.save(team).unwrap();
    assert_eq!(session.statement_count(), before);
    assert_eq!(unchanged.member_ids, vec![member.id.unwrap()]);
}

#[test]
fn change_team_moves_member_on_both_sides() {
    let mut conn = open_db_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();
    let teams = SqliteTeamRepository::try_new(&session).unwrap();
    let members = SqliteMemberRepository::try_new(&session).unwrap();

    let mut team_a = teams.save(Team::new("teamA")).unwrap();
    let mut team_b = teams.save(Team::new("teamB")).unwrap();
    let mut member = members
        .save(Member::with_team("member1", 10, &mut team_a).unwrap())
        .unwrap();
    let member_id = member.id.unwrap();

    members.change_team(&mut member, &mut team_b).unwrap();
    assert_eq!(member.team_id, team_b.id);
    assert!(team_b.has_member(member_id));
    assert_eq!(members.load_team(&member).unwrap(), Some(team_b.clone()));
    assert!(!teams
        .get_by_id(team_a.id.unwrap())
        .unwrap()
        .has_member(member_id));

    session.clear();
    let reloaded = members.get_by_id(member_id).unwrap();
    assert_eq!(reloaded.team_id, team_b.id);
    assert!(teams.get_by_id(team_b.id.unwrap()).unwrap().has_member(member_id));
    assert!(teams.get_by_id(team_a.id.unwrap()).unwrap().member_ids.is_empty());
}

#[test]
fn change_team_keeps_other_pending_edits_dirty() {
    let mut conn = open_db_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();
    let teams = SqliteTeamRepository::try_new(&session).unwrap();
    let members = SqliteMemberRepository::try_new(&session).unwrap();

    let mut team = teams.save(Team::new("teamA")).unwrap();
    let mut member = members.save(Member::with_age("member1", 10)).unwrap();

    member.age = 11;
    members.change_team(&mut member, &mut team).unwrap();
    members.save(member.clone()).unwrap();

    session.clear();
    let reloaded = members.get_by_id(member.id.unwrap()).unwrap();
    assert_eq!(reloaded.age, 11);
    assert_eq!(reloaded.team_id, team.id);
}

#[test]
fn change_team_requires_saved_entities() {
    let mut conn = open_db_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();
    let teams = SqliteTeamRepository::try_new(&session).unwrap();
    let members = SqliteMemberRepository::try_new(&session).unwrap();

    let mut saved_team = teams.save(Team::new("teamA")).unwrap();
    let mut draft = Member::new("draft");
    let err = members.change_team(&mut draft, &mut saved_team).unwrap_err();
    assert!(matches!(err, RepoError::Unsaved(EntityKind::Member)));

    let mut saved_member = members.save(Member::new("member1")).unwrap();
    let err = members
        .change_team(&mut saved_member, &mut Team::new("draft"))
        .unwrap_err();
    assert!(matches!(err, RepoError::Unsaved(EntityKind::Team)));

    assert!(matches!(
        Member::with_team("member2", 1, &mut Team::new("draft")),
        Err(ModelValidationError::UnsavedTeam)
    ));
}

#[test]
fn team_pages_sort_by_name() {
    let mut conn = open_db_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();
    let teams = SqliteTeamRepository::try_new(&session).unwrap();
    for name in ["teamB", "teamC", "teamA"] {
        teams.save(Team::new(name)).unwrap();
    }

    let request = PageRequest::new(0, 2, Sort::desc("name")).unwrap();
    let page = teams.find_all_paged(&request).unwrap();
    let names = page
        .content()
        .iter()
        .map(|team| team.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["teamC", "teamB"]);
    assert_eq!(page.total_elements(), 3);
}
