/// In-memory Quad Store
///
/// Keeps quads in insertion order behind a single `RwLock`. Lookups scan the
/// whole set; the store is sized for interactive exploration, not bulk data.
use super::QuadStore;
use crate::core::quad::Quad;
use crate::core::{Result, ShellError};
use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct StoreState {
    /// Quads in insertion order
    quads: Vec<Quad>,
    /// Membership index over `quads`
    present: HashSet<Quad>,
}

/// A `QuadStore` held entirely in memory.
#[derive(Debug, Default)]
pub struct MemStore {
    state: RwLock<StoreState>,
}

impl MemStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given quads, dropping duplicates
    pub fn with_quads<I>(quads: I) -> Self
    where
        I: IntoIterator<Item = Quad>,
    {
        let mut state = StoreState::default();
        for quad in quads {
            if state.present.insert(quad.clone()) {
                state.quads.push(quad);
            }
        }
        MemStore {
            state: RwLock::new(state),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| ShellError::Store("Failed to acquire store lock".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| ShellError::Store("Failed to acquire store lock".to_string()))
    }
}

impl QuadStore for MemStore {
    fn add_quad(&self, quad: Quad) -> Result<bool> {
        let mut state = self.write()?;
        if state.present.contains(&quad) {
            debug!("Quad already present: {}", quad);
            return Ok(false);
        }
        debug!("Adding quad: {}", quad);
        state.present.insert(quad.clone());
        state.quads.push(quad);
        Ok(true)
    }

    fn remove_quad(&self, quad: &Quad) -> Result<bool> {
        let mut state = self.write()?;
        if !state.present.remove(quad) {
            debug!("Quad not present: {}", quad);
            return Ok(false);
        }
        debug!("Removing quad: {}", quad);
        state.quads.retain(|q| q != quad);
        Ok(true)
    }

    fn quads_matching(
        &self,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&str>,
    ) -> Result<Vec<Quad>> {
        let state = self.read()?;
        Ok(state
            .quads
            .iter()
            .filter(|q| subject.map_or(true, |s| q.subject == s))
            .filter(|q| predicate.map_or(true, |p| q.predicate == p))
            .filter(|q| object.map_or(true, |o| q.object == o))
            .cloned()
            .collect())
    }

    fn nodes(&self) -> Result<Vec<String>> {
        let state = self.read()?;
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        for quad in &state.quads {
            for term in [&quad.subject, &quad.object] {
                if seen.insert(term.as_str()) {
                    nodes.push(term.clone());
                }
            }
        }
        Ok(nodes)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.read()?.quads.len())
    }
}
