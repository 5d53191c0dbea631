// src/source.rs
use std::path::{Path, PathBuf};

/// File names an 83P log may be stored under, in lookup order
pub const DATA_SOURCE_NAMES: [&str; 3] = ["data.83P", "Data.83P", "multibeam.83P"];

/// A set of files recorded together during one mission
pub trait LogGroup {
    /// Path of `name` within the group, if present
    fn get_file(&self, name: &str) -> Option<PathBuf>;
}

impl<G: LogGroup + ?Sized> LogGroup for &G {
    fn get_file(&self, name: &str) -> Option<PathBuf> {
        (**self).get_file(name)
    }
}

/// A log group backed by a plain directory
#[derive(Debug, Clone)]
pub struct DirectoryLogGroup {
    root: PathBuf,
}

impl DirectoryLogGroup {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryLogGroup { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl LogGroup for DirectoryLogGroup {
    fn get_file(&self, name: &str) -> Option<PathBuf> {
        let path = self.root.join(name);
        path.is_file().then_some(path)
    }
}

/// First 83P file found in `group`
pub fn find_data_source<G: LogGroup + ?Sized>(group: &G) -> Option<PathBuf> {
    DATA_SOURCE_NAMES
        .iter()
        .find_map(|name| group.get_file(name))
        .filter(|path| path.exists())
}
