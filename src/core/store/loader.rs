//! Bulk loading of N-Quads data into a store
use super::QuadStore;
use crate::core::quad::parse_quad;
use crate::core::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// Loads every quad statement from `reader` into `store`.
///
/// Blank lines and `#` comments are skipped. Lines that do not parse are
/// logged and skipped rather than aborting the load.
///
/// # Returns
///
/// The number of quads newly added to the store.
pub fn load_nquads<R: BufRead>(store: &dyn QuadStore, reader: R) -> Result<usize> {
    let mut added = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match parse_quad(trimmed) {
            Some(quad) => {
                if store.add_quad(quad)? {
                    added += 1;
                }
            }
            None => warn!("Skipping invalid quad on line {}: {}", index + 1, trimmed),
        }
    }
    Ok(added)
}

/// Opens `path` and loads it with [`load_nquads`].
pub fn load_nquads_file<P: AsRef<Path>>(store: &dyn QuadStore, path: P) -> Result<usize> {
    let path = path.as_ref();
    info!("Loading quads from {:?}", path);
    let file = File::open(path)?;
    let added = load_nquads(store, BufReader::new(file))?;
    info!("Loaded {} quads from {:?}", added, path);
    Ok(added)
}
