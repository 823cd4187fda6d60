//! The catalog facade: one owner for both indexes.
//!
//! Every mutation goes through [`Catalog`], which applies it to the [`OrderedIndex`] and mirrors
//! it into the [`HashIndex`] in the same call. A mutation that fails on either side leaves both
//! indexes as they were.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::avl::{Iter, OrderedIndex, RecordId};
use crate::config::Config;
use crate::error::{CatalogError, Result};
use crate::hash_index::{HashIndex, HashStats, Probe};
use crate::persist;
use crate::record::{Town, TownUpdate};

/// A record found through the hash index, with its probe diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    pub town: &'a Town,
    pub probe: Probe,
}

/// Outcome of loading a data file into a catalog.
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub loaded: usize,
    /// Malformed lines, duplicate towns and records rejected by the hash index.
    pub skipped: Vec<CatalogError>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    ordered: OrderedIndex,
    hashed: HashIndex,
    save_path: PathBuf,
}

impl Catalog {
    /// An empty catalog with the default configuration.
    pub fn new() -> Self {
        Self {
            ordered: OrderedIndex::new(),
            hashed: HashIndex::new(),
            save_path: Config::default().save_path,
        }
    }

    /// An empty catalog sized and pointed at files according to `config`.
    pub fn with_config(config: &Config) -> Result<Self> {
        Ok(Self {
            ordered: OrderedIndex::new(),
            hashed: HashIndex::with_capacity(config.capacity)?,
            save_path: config.save_path.clone(),
        })
    }

    /// Build a catalog from `config.data_path`.
    ///
    /// A missing data file is first seeded with [`persist::BOOTSTRAP`] when `config.bootstrap` is
    /// set; otherwise the catalog starts empty.
    pub fn open(config: &Config) -> Result<(Self, LoadSummary)> {
        let mut catalog = Self::with_config(config)?;
        let path = config.data_path.as_path();

        if !path.exists() {
            if !config.bootstrap {
                info!("{} not found, starting empty", path.display());
                return Ok((catalog, LoadSummary::default()));
            }
            info!("{} not found, writing bootstrap records", path.display());
            persist::write_bootstrap(path)?;
        }

        let summary = catalog.load_from(path)?;
        Ok((catalog, summary))
    }

    /// Insert every record of the file at `path`.
    ///
    /// Lines that fail to parse or insert are skipped and reported; only I/O errors abort.
    pub fn load_from(&mut self, path: &Path) -> Result<LoadSummary> {
        let report = persist::load(path)?;
        let mut summary = LoadSummary {
            loaded: 0,
            skipped: report.skipped,
        };

        for town in report.records {
            match self.insert(town) {
                Ok(_) => summary.loaded += 1,
                Err(err) => {
                    warn!("skipping record from {}: {err}", path.display());
                    summary.skipped.push(err);
                }
            }
        }

        info!(
            "loaded {} towns from {} ({} skipped)",
            summary.loaded,
            path.display(),
            summary.skipped.len()
        );
        Ok(summary)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn ordered(&self) -> &OrderedIndex {
        &self.ordered
    }

    pub fn hashed(&self) -> &HashIndex {
        &self.hashed
    }

    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    /// Add a new town to both indexes.
    pub fn insert(&mut self, town: Town) -> Result<RecordId> {
        town.validate()?;
        let key = town.town.clone();
        let id = self.ordered.insert(town)?;

        match self.hashed.insert(&key, id) {
            Ok(slot) => {
                debug!("inserted {key:?} as {id:?} at hash slot {slot}");
                Ok(id)
            }
            Err(err) => {
                // Undo the tree insert so neither index holds the town.
                self.ordered.remove(&key)?;
                Err(err)
            }
        }
    }

    /// Insert `town`, or replace every non-key field of the existing record with the same name.
    pub fn upsert(&mut self, town: Town) -> Result<RecordId> {
        town.validate()?;
        match self.ordered.id_of(&town.town) {
            Some(id) => {
                debug!("replacing {:?}", town.town);
                self.ordered.replace(town)?;
                Ok(id)
            }
            None => self.insert(town),
        }
    }

    /// Point lookup through the ordered index.
    pub fn find(&self, key: &str) -> Result<&Town> {
        self.ordered
            .find(key)
            .ok_or_else(|| CatalogError::NotFound(key.to_owned()))
    }

    /// Point lookup through the hash index, reporting the collisions on the probe path.
    pub fn lookup(&self, key: &str) -> Result<Lookup<'_>> {
        let probe = self.hashed.find(key)?;
        let town = self
            .ordered
            .get(probe.record)
            .ok_or_else(|| CatalogError::NotFound(key.to_owned()))?;
        Ok(Lookup { town, probe })
    }

    /// Change the population, elevation and municipality flag of `key`.
    pub fn update(&mut self, key: &str, update: TownUpdate) -> Result<&Town> {
        update.validate()?;
        self.ordered.update(key, update)
    }

    /// Remove `key` from both indexes, returning its record.
    pub fn remove(&mut self, key: &str) -> Result<Town> {
        let id = self
            .ordered
            .id_of(key)
            .ok_or_else(|| CatalogError::NotFound(key.to_owned()))?;
        let hashed = self.hashed.remove(key)?;
        debug_assert_eq!(hashed, id, "hash entry must reference the ordered record");

        let town = self.ordered.remove(key)?;
        debug!("removed {key:?} ({id:?})");
        Ok(town)
    }

    /// Remove `key` and rewrite the save file without it.
    pub fn remove_and_save(&mut self, key: &str) -> Result<Town> {
        let town = self.remove(key)?;
        self.save()?;
        Ok(town)
    }

    /// Every town in alphabetical order.
    pub fn iter(&self) -> Iter<'_> {
        self.ordered.iter()
    }

    pub fn above_population(&self, threshold: u32) -> impl Iterator<Item = &Town> + '_ {
        self.ordered.above_population(threshold)
    }

    pub fn with_municipality<'a>(&'a self, flag: &'a str) -> impl Iterator<Item = &'a Town> + 'a {
        self.ordered.with_municipality(flag)
    }

    pub fn hash_stats(&self) -> HashStats {
        self.hashed.stats()
    }

    /// Write every town to the configured save file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&self.save_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        persist::save(path, self.ordered.iter())?;
        info!("saved {} towns to {}", self.len(), path.display());
        Ok(())
    }

    /// Serialize every town to `sink` in ascending order.
    pub fn write_to<W: Write>(&self, sink: W) -> Result<()> {
        self.ordered.serialize(sink)?;
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Town;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
