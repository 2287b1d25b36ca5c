/// Quad Store Module
///
/// This module provides the storage side of triplesh, organized into focused
/// submodules.
///
/// ## Architecture
///
/// - **Store contract** (this file): the `QuadStore` trait consumed by the
///   REPL dispatcher (add/remove) and by the query-language sessions (match)
/// - **In-memory store** (`memory.rs`): the `MemStore` implementation
/// - **Loading** (`loader.rs`): bulk import of N-Quads files at startup
///
/// ## Concurrency
///
/// Stores are shared between the REPL thread and the query producer thread,
/// so every implementation must be `Send + Sync` and do its own locking.
pub mod loader;
pub mod memory;

pub use loader::*;
pub use memory::*;

use crate::core::quad::Quad;
use crate::core::Result;

/// Mutation and lookup operations over a set of quads.
pub trait QuadStore: Send + Sync {
    /// Inserts a quad. Returns `false` if it was already present.
    fn add_quad(&self, quad: Quad) -> Result<bool>;

    /// Removes a quad. Returns `false` if it was not present.
    fn remove_quad(&self, quad: &Quad) -> Result<bool>;

    /// Returns every quad matching the given terms, in insertion order.
    /// `None` acts as a wildcard.
    fn quads_matching(
        &self,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&str>,
    ) -> Result<Vec<Quad>>;

    /// Returns every distinct subject or object, in first-seen order.
    fn nodes(&self) -> Result<Vec<String>>;

    /// Number of quads currently stored.
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
