use std::path::PathBuf;

use crate::hash_index::DEFAULT_CAPACITY;

/// File read at startup.
pub const DEFAULT_DATA_PATH: &str = "districts.txt";
/// File written by save operations.
pub const DEFAULT_SAVE_PATH: &str = "towns.txt";

/// Configuration for a [`Catalog`](crate::Catalog).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Hash index slot count; fixed for the lifetime of the catalog
    pub capacity: usize,
    /// Data file loaded by [`Catalog::open`](crate::Catalog::open)
    pub data_path: PathBuf,
    /// Destination of save operations
    pub save_path: PathBuf,
    /// Seed a missing data file with the bootstrap records
    pub bootstrap: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            save_path: PathBuf::from(DEFAULT_SAVE_PATH),
            bootstrap: true,
        }
    }
}
