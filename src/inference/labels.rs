//! Class label table

use crate::error::{Result, WorkerError};
use std::path::Path;

/// Ordered class labels, index-aligned with the model output.
#[derive(Debug, Clone)]
pub struct Labels {
    names: Vec<String>,
}

impl Labels {
    /// Load labels from a newline-separated file (one label per line, blank
    /// lines ignored).
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let names: Vec<String> = content
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();

        if names.is_empty() {
            return Err(WorkerError::Config(format!(
                "no labels found in {}",
                path.display()
            )));
        }

        Ok(Self { names })
    }

    pub fn from_names(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Label for a class index; indices past the table map to "unknown".
    pub fn get(&self, index: usize) -> &str {
        self.names.get(index).map(|s| s.as_str()).unwrap_or("unknown")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
