//! Repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the generic CRUD contract and the member/team finder contracts.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate entities before any SQL mutation.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Single-result finders never pick one row out of several.

use crate::db::migrations::{current_user_version, latest_version};
use crate::query::page::PageRequest;
use rusqlite::Connection;

pub mod crud;
pub mod error;
pub mod member_query_repo;
pub mod member_repo;
pub mod team_repo;

use error::{RepoError, RepoResult};

pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

/// Collapses finder rows into the single-result contract.
pub(crate) fn single_result<T>(finder: &'static str, mut rows: Vec<T>) -> RepoResult<Option<T>> {
    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        count => Err(RepoError::TooManyResults { finder, count }),
    }
}

/// Total element count for a page, skipping the count statement when the
/// fetched window already determines it.
pub(crate) fn page_total(
    request: &PageRequest,
    fetched: usize,
    count: impl FnOnce() -> RepoResult<u64>,
) -> RepoResult<u64> {
    let size = request.size() as usize;
    let offset = request.offset();
    if offset == 0 {
        if fetched < size {
            return Ok(fetched as u64);
        }
        return count();
    }
    if fetched != 0 && fetched < size {
        return Ok(offset + fetched as u64);
    }
    count()
}

pub(crate) fn parse_id_list(value: Option<String>, column: &str) -> RepoResult<Vec<i64>> {
    let Some(text) = value else {
        return Ok(Vec::new());
    };
    let mut ids = text
        .split(',')
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.trim().parse::<i64>().map_err(|_| {
                RepoError::InvalidData(format!("invalid id `{part}` in {column}"))
            })
        })
        .collect::<RepoResult<Vec<_>>>()?;
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::{page_total, parse_id_list, single_result};
    use crate::query::page::PageRequest;
    use crate::repo::error::RepoError;

    #[test]
    fn single_result_rejects_multiple_rows() {
        assert_eq!(single_result::<u8>("finder", vec![]).unwrap(), None);
        assert_eq!(single_result("finder", vec![1]).unwrap(), Some(1));
        let err = single_result("finder", vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, RepoError::TooManyResults { finder: "finder", count: 3 }));
    }

    #[test]
    fn page_total_skips_count_for_short_first_page() {
        let request = PageRequest::of(0, 5).unwrap();
        let total = page_total(&request, 3, || panic!("count must not run")).unwrap();
        assert_eq!(total, 3);
    }

    #[test]
    fn page_total_derives_total_from_short_tail_page() {
        let request = PageRequest::of(2, 5).unwrap();
        let total = page_total(&request, 2, || panic!("count must not run")).unwrap();
        assert_eq!(total, 12);
    }

    #[test]
    fn page_total_counts_full_pages() {
        let request = PageRequest::of(0, 3).unwrap();
        assert_eq!(page_total(&request, 3, || Ok(5)).unwrap(), 5);
        let past_end = PageRequest::of(4, 3).unwrap();
        assert_eq!(page_total(&past_end, 0, || Ok(5)).unwrap(), 5);
    }

    #[test]
    fn parse_id_list_sorts_and_rejects_garbage() {
        assert_eq!(parse_id_list(Some("3,1,2".to_string()), "c").unwrap(), vec![1, 2, 3]);
        assert!(parse_id_list(None, "c").unwrap().is_empty());
        assert!(matches!(
            parse_id_list(Some("1,x".to_string()), "c"),
            Err(RepoError::InvalidData(_))
        ));
    }
}
