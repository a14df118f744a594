//! The repository façade (spec §4.10), the working-tree actor (spec §4.6),
//! on-disk initialization (spec §6), and the plumbing surface (spec §4.9)
//! that ties `gk-hash`, `gk-object`, `gk-odb`, `gk-index`, `gk-ref`, and
//! `gk-config` together behind one handle.

mod error;
mod init;
mod objects;
mod repository;
mod worktree;

pub use error::Error;
pub use init::{layout, INITIAL_HEAD};
pub use repository::Repository;
