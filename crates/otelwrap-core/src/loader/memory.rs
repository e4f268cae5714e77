use std::collections::HashMap;

use super::{PackageSource, SourceFile};
use crate::errors::Result;

/// Package sources held in memory, keyed by import path
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    packages: HashMap<String, Vec<SourceFile>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one file to the package at `path`.
    pub fn with_file(mut self, path: &str, name: &str, text: &str) -> Self {
        self.add_file(path, name, text);
        self
    }

    pub fn add_file(&mut self, path: &str, name: &str, text: &str) {
        self.packages
            .entry(path.to_string())
            .or_default()
            .push(SourceFile::new(name, text));
    }
}

impl PackageSource for MemorySource {
    fn package_files(&self, path: &str) -> Result<Option<Vec<SourceFile>>> {
        Ok(self.packages.get(path).cloned())
    }
}
