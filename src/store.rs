use crate::error::{Result, WmError};
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Remembered values, grouped by category and then by name.
pub trait DefaultStore {
    fn get(&self, category: &str, name: &str) -> Result<Option<String>>;
    fn set(&mut self, category: &str, name: &str, value: &str) -> Result<()>;
}

type Categories = BTreeMap<String, BTreeMap<String, String>>;

fn lookup(values: &Categories, category: &str, name: &str) -> Option<String> {
    values.get(category).and_then(|c| c.get(name)).cloned()
}

fn insert(values: &mut Categories, category: &str, name: &str, value: &str) {
    values
        .entry(category.to_string())
        .or_default()
        .insert(name.to_string(), value.to_string());
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Categories,
}

#[cfg(test)]
impl DefaultStore for MemoryStore {
    fn get(&self, category: &str, name: &str) -> Result<Option<String>> {
        Ok(lookup(&self.values, category, name))
    }

    fn set(&mut self, category: &str, name: &str, value: &str) -> Result<()> {
        insert(&mut self.values, category, name, value);
        Ok(())
    }
}

/// A store kept in a single JSON file. The whole file is rewritten on every
/// `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Categories,
}

impl JsonFileStore {
    /// Opens the store at `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => Categories::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| WmError::StoreFormat {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No default store at {}, starting empty", path.display());
                Categories::new()
            }
            Err(source) => return Err(WmError::Store { path, source }),
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let store_error = |source: std::io::Error| WmError::Store {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(store_error)?;

        let mut file = NamedTempFile::new_in(dir).map_err(store_error)?;
        serde_json::to_writer_pretty(&mut file, &self.values).map_err(|source| WmError::StoreFormat {
            path: self.path.clone(),
            source,
        })?;
        file.write_all(b"\n").map_err(store_error)?;
        file.persist(&self.path).map_err(|e| store_error(e.error))?;
        Ok(())
    }
}

impl DefaultStore for JsonFileStore {
    fn get(&self, category: &str, name: &str) -> Result<Option<String>> {
        Ok(lookup(&self.values, category, name))
    }

    fn set(&mut self, category: &str, name: &str, value: &str) -> Result<()> {
        debug!("Storing {}.{} = {:?}", category, name, value);
        insert(&mut self.values, category, name, value);
        self.persist()
    }
}
