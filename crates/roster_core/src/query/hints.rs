//! Per-finder query hints.

/// How a member finder treats the team association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Members only; each `load_team` may cost one extra statement.
    #[default]
    Lazy,
    /// Teams are joined into the member statement and cached.
    Join,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    #[default]
    None,
    /// Holds the store write lock over the matched rows until the session
    /// ends.
    PessimisticWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryOptions {
    pub fetch: FetchMode,
    pub lock: LockMode,
    /// Results bypass the identity cache.
    pub read_only: bool,
}

impl QueryOptions {
    pub fn fetch_join() -> Self {
        Self {
            fetch: FetchMode::Join,
            ..Self::default()
        }
    }

    pub fn pessimistic_write() -> Self {
        Self {
            lock: LockMode::PessimisticWrite,
            ..Self::default()
        }
    }

    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }
}
