//! Command file store
//!
//! A directory of `commandsN.csv` job files.

use std::fs;
use std::path::{Path, PathBuf};

use super::{CommandSequence, SequenceError};

/// Extension of command files
pub const COMMAND_FILE_EXTENSION: &str = "csv";

/// Name prefix of generated command files
pub const COMMAND_FILE_PREFIX: &str = "commands";

/// Directory holding command files
#[derive(Debug, Clone)]
pub struct CommandStore {
    dir: PathBuf,
}

impl CommandStore {
    /// Use `dir` as the store; it is not created until the first save
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of all command files, sorted
    pub fn list(&self) -> Result<Vec<String>, SequenceError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(COMMAND_FILE_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Name for the next generated file: one past the highest `commandsN.csv` present
    pub fn next_file_name(&self) -> Result<String, SequenceError> {
        let next = self
            .list()?
            .iter()
            .filter_map(|name| file_index(name))
            .max()
            .map_or(1, |n| n + 1);
        Ok(format!("{COMMAND_FILE_PREFIX}{next}.{COMMAND_FILE_EXTENSION}"))
    }

    /// Resolve a file name against the store; absolute paths are used as given
    pub fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }

    /// Load a command file by name
    pub fn load(&self, name: &str) -> Result<CommandSequence, SequenceError> {
        CommandSequence::load(self.resolve(name))
    }

    /// Save a sequence under the next free `commandsN.csv` name, returning its path
    pub fn save(&self, sequence: &CommandSequence) -> Result<PathBuf, SequenceError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(self.next_file_name()?);
        sequence.save(&path)?;
        tracing::info!("Saved {} commands to {}", sequence.len(), path.display());
        Ok(path)
    }
}

/// `N` of a `commandsN.csv` file name
fn file_index(name: &str) -> Option<u32> {
    name.strip_prefix(COMMAND_FILE_PREFIX)?
        .strip_suffix(COMMAND_FILE_EXTENSION)?
        .strip_suffix('.')?
        .parse()
        .ok()
}
