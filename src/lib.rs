//! # town-index
//!
//! An in-memory catalog of municipal records keyed by town name.
//!
//! Two indexes are kept in step by the [`Catalog`] facade:
//!
//! - [`OrderedIndex`]: an AVL tree that owns every record and gives alphabetical iteration and
//!   O(log n) insert/find/remove.
//! - [`HashIndex`]: a fixed-capacity, linearly probed table from town name to [`RecordId`],
//!   for point lookups with collision and load-factor diagnostics.
//!
//! Records persist to a flat `district:town:population:elevation:municipality` file.
//!
//! ## Example
//!
//! ```rust
//! use town_index::{Catalog, Town};
//!
//! let mut catalog = Catalog::new();
//! catalog.insert(Town::new("AlQuds", "Hezma", 5000, 550, "yes")).unwrap();
//! catalog.insert(Town::new("Nablus", "Asira", 8000, 350, "yes")).unwrap();
//!
//! let names: Vec<_> = catalog.iter().map(|t| t.town.as_str()).collect();
//! assert_eq!(names, ["Asira", "Hezma"]);
//!
//! let found = catalog.lookup("Hezma").unwrap();
//! assert_eq!(found.town.population, 5000);
//! ```

#![warn(clippy::all)]

pub mod avl;
pub mod catalog;
pub mod config;
pub mod error;
pub mod hash_index;
pub mod logger;
pub mod persist;
pub mod record;
pub mod shell;

pub use avl::{OrderedIndex, RecordId};
pub use catalog::{Catalog, LoadSummary, Lookup};
pub use config::Config;
pub use error::{CatalogError, ParseError, Result};
pub use hash_index::{HashIndex, HashStats, Probe};
pub use record::{Town, TownUpdate};

#[cfg(test)]
mod proptests;
