//! The migration catalog: an ordered, name-unique list of steps.
//!
//! A [`Catalog`] is an explicit value built by the caller, either in code via
//! [`Catalog::builder`] or from YAML catalog files via [`Catalog::load`].
//! Construction validates every descriptor and rejects duplicate names, so
//! a catalog that exists is safe to hand to the engine.

use crate::error::{CoreError, CoreResult};
use crate::migration::{AddColumn, Migration, RawStatement};
use crate::migration_name::MigrationName;
use crate::schema::{Index, Table};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A named migration at a fixed position in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStep {
    /// Unique, immutable step name; the key in the migration log
    pub name: MigrationName,
    /// Zero-based registration position
    pub ordinal: usize,
    /// What the step does
    pub migration: Migration,
}

/// Ordered collection of migration steps with globally unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    steps: Vec<MigrationStep>,
}

/// Accumulates `(name, migration)` pairs; validation happens in
/// [`CatalogBuilder::build`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    entries: Vec<(String, Migration)>,
}

impl CatalogBuilder {
    /// Append a step. Registration order is application order.
    pub fn step(mut self, name: impl Into<String>, migration: Migration) -> Self {
        self.entries.push((name.into(), migration));
        self
    }

    pub fn build(self) -> CoreResult<Catalog> {
        Catalog::from_entries(self.entries)
    }
}

/// On-disk shape of a catalog file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    migrations: Vec<CatalogEntry>,
}

/// One entry: a name plus exactly one kind key.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogEntry {
    name: String,
    #[serde(default)]
    create_table: Option<Table>,
    #[serde(default)]
    add_column: Option<AddColumn>,
    #[serde(default)]
    add_index: Option<Index>,
    #[serde(default)]
    raw: Option<RawStatement>,
}

impl CatalogEntry {
    fn into_migration(self) -> Result<(String, Migration), String> {
        let mut kinds = Vec::new();
        if let Some(table) = self.create_table {
            kinds.push(Migration::CreateTable(table));
        }
        if let Some(add) = self.add_column {
            kinds.push(Migration::AddColumn(add));
        }
        if let Some(index) = self.add_index {
            kinds.push(Migration::AddIndex(index));
        }
        if let Some(raw) = self.raw {
            kinds.push(Migration::Raw(raw));
        }

        match kinds.len() {
            1 => Ok((self.name, kinds.remove(0))),
            0 => Err(format!(
                "migration '{}' needs one of create_table, add_column, add_index, raw",
                self.name
            )),
            _ => {
                let found: Vec<String> = kinds.iter().map(|m| m.kind().to_string()).collect();
                Err(format!(
                    "migration '{}' has more than one kind: {}",
                    self.name,
                    found.join(", ")
                ))
            }
        }
    }
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Build a catalog from ordered `(name, migration)` pairs.
    ///
    /// Fails with [`CoreError::DuplicateMigration`] on the first repeated
    /// name and with [`CoreError::InvalidMigration`] on the first descriptor
    /// that violates its invariants.
    pub fn from_entries<I, S>(entries: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (S, Migration)>,
        S: Into<String>,
    {
        let mut seen: HashSet<MigrationName> = HashSet::new();
        let mut steps = Vec::new();

        for (ordinal, (name, migration)) in entries.into_iter().enumerate() {
            let name = MigrationName::try_new(name.into())
                .ok_or(CoreError::EmptyMigrationName { ordinal })?;

            if seen.contains(&name) {
                return Err(CoreError::DuplicateMigration {
                    name: name.into_inner(),
                });
            }

            migration
                .check()
                .map_err(|reason| CoreError::InvalidMigration {
                    name: name.to_string(),
                    reason,
                })?;

            seen.insert(name.clone());
            steps.push(MigrationStep {
                name,
                ordinal,
                migration,
            });
        }

        Ok(Self { steps })
    }

    /// Load every catalog file under `dirs`.
    ///
    /// Directories are read in the given order; within a directory, `.yml`
    /// and `.yaml` files are read in lexicographic file-name order; within a
    /// file, steps keep their declared order.
    pub fn load(dirs: &[PathBuf]) -> CoreResult<Self> {
        let mut entries = Vec::new();
        for dir in dirs {
            for file in catalog_files(dir)? {
                log::debug!("Loading catalog file {}", file.display());
                entries.extend(read_catalog_file(&file)?);
            }
        }
        Self::from_entries(entries)
    }

    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&MigrationStep> {
        self.steps.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MigrationStep> {
        self.steps.iter()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a MigrationStep;
    type IntoIter = std::slice::Iter<'a, MigrationStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// YAML files directly under `dir`, sorted by file name.
fn catalog_files(dir: &Path) -> CoreResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CoreError::CatalogPathNotFound {
            path: dir.display().to_string(),
        });
    }

    let mut files = Vec::new();
    let read_dir = std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;
    for entry in read_dir {
        let path = entry?.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "yml" || e == "yaml");
        if path.is_file() && is_yaml {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_catalog_file(path: &Path) -> CoreResult<Vec<(String, Migration)>> {
    let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })?;
    let file: CatalogFile =
        serde_yaml::from_str(&content).map_err(|e| CoreError::CatalogParseError {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
    file.migrations
        .into_iter()
        .map(|entry| {
            entry
                .into_migration()
                .map_err(|details| CoreError::CatalogParseError {
                    path: path.display().to_string(),
                    details,
                })
        })
        .collect()
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
