//! `.env` file support without touching the process environment.

use anyhow::Result;
use ide_llm::ConfigSource;
use std::collections::HashMap;
use std::path::Path;

/// Process environment layered over values read from a `.env` file.
/// Variables already set in the process win, as with `dotenvy::from_path`.
#[derive(Debug, Clone, Default)]
pub struct EnvFileSource {
    file: HashMap<String, String>,
}

impl EnvFileSource {
    /// Reads `path`; a missing file yields an empty layer.
    pub fn load(path: &Path) -> Result<Self> {
        let iter = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter,
            Err(e) if e.not_found() => {
                tracing::debug!(path = %path.display(), "no env file; using process environment only");
                return Ok(Self::default());
            }
            Err(e) => return Err(anyhow::anyhow!("read env file {}: {e}", path.display())),
        };

        let mut file = HashMap::new();
        for item in iter {
            let (key, value) =
                item.map_err(|e| anyhow::anyhow!("parse env file {}: {e}", path.display()))?;
            file.insert(key, value);
        }
        tracing::debug!(path = %path.display(), vars = file.len(), "env file loaded");
        Ok(Self { file })
    }

    fn lookup(&self, name: &str, process: Option<String>) -> Option<String> {
        process.or_else(|| self.file.get(name).cloned())
    }
}

impl ConfigSource for EnvFileSource {
    fn var(&self, name: &str) -> Option<String> {
        self.lookup(name, std::env::var(name).ok())
    }
}
