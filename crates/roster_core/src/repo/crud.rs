//! Generic CRUD contract.

use crate::query::page::{Page, PageRequest};
use crate::repo::error::{EntityKind, RepoError, RepoResult};

/// Create/read/update/delete plus paging over one entity type.
///
/// Absence on lookup is `Ok(None)`; only the `*_by_id` operations that
/// require presence return `RepoError::NotFound`.
pub trait CrudRepository {
    type Entity;
    type Id: Copy + Into<i64>;

    /// Kind reported by `NotFound` errors.
    const KIND: EntityKind;

    /// Inserts a new entity (assigning its id) or updates a saved one.
    fn save(&self, entity: Self::Entity) -> RepoResult<Self::Entity>;

    fn find_by_id(&self, id: Self::Id) -> RepoResult<Option<Self::Entity>>;

    /// Like `find_by_id`, but absence is an error.
    fn get_by_id(&self, id: Self::Id) -> RepoResult<Self::Entity> {
        self.find_by_id(id)?.ok_or(RepoError::NotFound {
            entity: Self::KIND,
            id: id.into(),
        })
    }

    /// All entities in ascending id order.
    fn find_all(&self) -> RepoResult<Vec<Self::Entity>>;

    fn find_all_paged(&self, request: &PageRequest) -> RepoResult<Page<Self::Entity>>;

    fn count(&self) -> RepoResult<u64>;

    /// Removes the entity. Unsaved or already removed entities are a no-op.
    fn delete(&self, entity: &Self::Entity) -> RepoResult<()>;

    /// Removes the entity with `id`; absence is an error.
    fn delete_by_id(&self, id: Self::Id) -> RepoResult<()>;
}
