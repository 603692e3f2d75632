use roster_core::db::open_db_in_memory;
use roster_core::{
    transactional, CrudRepository, EntityKind, Member, ModelValidationError, RepoError, Session,
    SqliteMemberRepository,
};

#[test]
fn basic_crud() {
    let mut conn = open_db_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();
    let members = SqliteMemberRepository::try_new(&session).unwrap();

    let member1 = members.save(Member::new("member1")).unwrap();
    let member2 = members.save(Member::new("member2")).unwrap();
    assert!(member1.id.is_some());
    assert_ne!(member1.id, member2.id);

    let found1 = members.find_by_id(member1.id.unwrap()).unwrap().unwrap();
    let found2 = members.find_by_id(member2.id.unwrap()).unwrap().unwrap();
    assert_eq!(found1, member1);
    assert_eq!(found2, member2);

    assert_eq!(members.find_all().unwrap(), vec![member1.clone(), member2.clone()]);
    assert_eq!(members.count().unwrap(), 2);

    members.delete(&member1).unwrap();
    members.delete(&member2).unwrap();
    assert_eq!(members.count().unwrap(), 0);
    assert!(members.find_by_id(member1.id.unwrap()).unwrap().is_none());
}

#[test]
fn saved_member_is_readable_after_clear() {
    let mut conn = open_db_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();
    let members = SqliteMemberRepository::try_new(&session).unwrap();

    let saved = members.save(Member::with_age("memberA", 33)).unwrap();
    session.clear();

    let loaded = members.get_by_id(saved.id.unwrap()).unwrap();
    assert_eq!(loaded.user_name, "memberA");
    assert_eq!(loaded.age, 33);
    assert_eq!(loaded.team_id, None);
}

#[test]
fn unchanged_save_issues_no_statement() {
    let mut conn = open_db_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();
    let members = SqliteMemberRepository::try_new(&session).unwrap();

    let mut member = members.save(Member::with_age("member1", 10)).unwrap();
    let before = session.statement_count();
    members.save(member.clone()).unwrap();
    assert_eq!(session.statement_count(), before);

    member.age = 11;
    members.save(member.clone()).unwrap();
    assert_eq!(session.statement_count(), before + 1);

    session.clear();
    assert_eq!(members.get_by_id(member.id.unwrap()).unwrap().age, 11);
}

#[test]
fn lookups_that_require_presence_report_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();
    let members = SqliteMemberRepository::try_new(&session).unwrap();

    assert!(members.find_by_id(42).unwrap().is_none());

    let err = members.get_by_id(42).unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: EntityKind::Member,
            id: 42
        }
    ));

    assert!(members.delete_by_id(42).unwrap_err().is_not_found());
}

#[test]
fn delete_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();
    let members = SqliteMemberRepository::try_new(&session).unwrap();

    members.delete(&Member::new("never saved")).unwrap();

    let saved = members.save(Member::new("member1")).unwrap();
    members.delete(&saved).unwrap();
    members.delete(&saved).unwrap();
    assert_eq!(members.count().unwrap(), 0);
}

#[test]
fn updating_a_vanished_row_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();
    let members = SqliteMemberRepository::try_new(&session).unwrap();

    let mut member = members.save(Member::new("member1")).unwrap();
    members.delete_by_id(member.id.unwrap()).unwrap();

    member.age = 5;
    assert!(members.save(member).unwrap_err().is_not_found());
}

#[test]
fn blank_user_name_is_rejected_before_sql() {
    let mut conn = open_db_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();
    let members = SqliteMemberRepository::try_new(&session).unwrap();

    let before = session.statement_count();
    let err = members.save(Member::new("   ")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::BlankUserName)
    ));
    assert_eq!(session.statement_count(), before);
}

#[test]
fn transactional_commits_on_ok_and_rolls_back_on_err() {
    let mut conn = open_db_in_memory().unwrap();

    transactional(&mut conn, |session| {
        SqliteMemberRepository::try_new(session)?.save(Member::new("kept"))
    })
    .unwrap();

    let err = transactional(&mut conn, |session| -> Result<(), RepoError> {
        SqliteMemberRepository::try_new(session)?.save(Member::new("discarded"))?;
        Err(RepoError::InvalidData("abort".to_string()))
    })
    .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));

    let names = transactional(&mut conn, |session| {
        let members = SqliteMemberRepository::try_new(session)?;
        Ok::<_, RepoError>(
            members
                .find_all()?
                .into_iter()
                .map(|member| member.user_name)
                .collect::<Vec<_>>(),
        )
    })
    .unwrap();
    assert_eq!(names, vec!["kept".to_string()]);
}

#[test]
fn unmigrated_connection_is_rejected() {
    let mut conn = rusqlite::Connection::open_in_memory().unwrap();
    let session = Session::begin(&mut conn).unwrap();

    let err = SqliteMemberRepository::try_new(&session).err().unwrap();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn dropped_session_rolls_back() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let session = Session::begin(&mut conn).unwrap();
        let members = SqliteMemberRepository::try_new(&session).unwrap();
        members.save(Member::new("uncommitted")).unwrap();
    }

    let session = Session::begin(&mut conn).unwrap();
    let members = SqliteMemberRepository::try_new(&session).unwrap();
    assert_eq!(members.count().unwrap(), 0);
}
