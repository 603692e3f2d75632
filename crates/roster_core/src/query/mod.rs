//! Query building blocks shared by repositories.
//!
//! # Responsibility
//! - Specification (predicate) builder and its SQL rendering.
//! - Paging/slicing request and result types.
//! - Per-finder fetch, lock and read-only hints.

pub mod hints;
pub mod page;
pub(crate) mod select;
pub mod spec;
