use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Tool execution context
///
/// File tools resolve every path against `work_dir` and refuse to leave it.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub work_dir: PathBuf,
    pub session_id: String,
    pub environment: HashMap<String, String>,
}

impl ToolContext {
    pub fn new(work_dir: PathBuf, session_id: String) -> Self {
        Self {
            work_dir,
            session_id,
            environment: HashMap::new(),
        }
    }

    pub fn with_env(mut self, key: String, value: String) -> Self {
        self.environment.insert(key, value);
        self
    }

    /// Resolve a model-supplied path inside `work_dir`.
    ///
    /// Absolute paths and `..` components that would climb out of the base
    /// directory are rejected.
    pub fn resolve_path(&self, relative: &str) -> Result<PathBuf> {
        let requested = Path::new(relative);
        if requested.is_absolute() {
            return Err(anyhow!("Absolute paths are not allowed: {}", relative));
        }

        let mut resolved = PathBuf::new();
        for component in requested.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !resolved.pop() {
                        return Err(anyhow!("Path escapes the working directory: {}", relative));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(anyhow!("Absolute paths are not allowed: {}", relative));
                }
            }
        }

        Ok(self.work_dir.join(resolved))
    }
}
