//! Common test utilities and helpers for integration tests

use mrposc_filter::{AddressFilter, AddressTable, OscArg, OscMessage};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Write a table configuration into `dir` and return its path
pub fn write_table_file(dir: &Path, yaml: &str) -> PathBuf {
    let path = dir.join("table.yaml");
    std::fs::write(&path, yaml)
        .unwrap_or_else(|_| panic!("Failed to write table file {:?}", path));
    path
}

/// A filter over an explicit list of addresses
pub fn reduced_filter(paths: &[&str]) -> AddressFilter {
    let table = AddressTable::from_paths(paths.iter().copied()).expect("Invalid reduced table");
    AddressFilter::new(Arc::new(table))
}

/// Build a message from atoms the way a transport would hand it over
pub fn message(atoms: Vec<OscArg>) -> OscMessage {
    OscMessage::from_atoms(atoms)
}
