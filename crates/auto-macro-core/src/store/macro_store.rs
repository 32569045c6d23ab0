//! JSON persistence for recorded macros.
//!
//! One `<name>.json` document per macro inside a single directory. Writes
//! go through a temp file and a rename so a crash never leaves a truncated
//! document behind.

use crate::{CoreResult, Macro, MacroError};

use std::{
    fs,
    io::{self, ErrorKind, Write},
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument};

const MACRO_EXTENSION: &str = "json";
const MAX_NAME_LEN: usize = 200;

/// Directory-backed macro store.
#[derive(Debug, Clone)]
pub struct MacroStore {
    dir: PathBuf,
}

impl MacroStore {
    /// Open the store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created.
    #[track_caller]
    #[instrument(skip(dir))]
    pub fn open<P: AsRef<Path>>(dir: P) -> CoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();

        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            debug!(macro_dir = ?dir, "Created macro directory");
        }

        info!(macro_dir = ?dir, "Macro store opened");

        Ok(Self { dir })
    }

    /// Directory holding the macro documents.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document for `name`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMacroName` if `name` cannot be used as a file name.
    #[track_caller]
    pub fn path_for(&self, name: &str) -> CoreResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{MACRO_EXTENSION}")))
    }

    /// Whether a document for `name` exists.
    #[track_caller]
    pub fn exists(&self, name: &str) -> CoreResult<bool> {
        Ok(self.path_for(name)?.is_file())
    }

    /// Persist `recorded`, replacing any macro with the same name.
    ///
    /// Uses the write-temp, fsync, rename pattern.
    #[track_caller]
    #[instrument(skip(self, recorded), fields(name = %recorded.name))]
    pub fn save(&self, recorded: &Macro) -> CoreResult<()> {
        let path = self.path_for(&recorded.name)?;

        let contents = serde_json::to_string_pretty(recorded).map_err(|e| {
            MacroError::CorruptMacro {
                name: recorded.name.clone(),
                reason: format!("Failed to serialize: {}", e),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        let temp_path = self
            .dir
            .join(format!(".{}.{MACRO_EXTENSION}.tmp", recorded.name));

        let written = write_synced(&temp_path, contents.as_bytes())
            .and_then(|()| fs::rename(&temp_path, &path));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        info!(
            path = ?path,
            event_count = recorded.len(),
            "Macro saved (atomic write)"
        );

        Ok(())
    }

    /// Load the macro called `name`.
    ///
    /// # Errors
    ///
    /// `NotFound` if no document exists, `CorruptMacro` if it cannot be
    /// parsed, names a different macro, or has decreasing timestamps.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn load(&self, name: &str) -> CoreResult<Macro> {
        let path = self.path_for(name)?;

        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(MacroError::NotFound {
                    name: name.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let corrupt = |reason: String| MacroError::CorruptMacro {
            name: name.to_string(),
            reason,
            location: ErrorLocation::from(Location::caller()),
        };

        let loaded: Macro = serde_json::from_str(&contents)
            .map_err(|e| corrupt(format!("Failed to parse: {}", e)))?;

        if loaded.name != name {
            return Err(corrupt(format!(
                "Document is named {:?}, expected {:?}",
                loaded.name, name
            )));
        }

        if let Some(index) = loaded.first_out_of_order() {
            return Err(corrupt(format!(
                "Event {} is earlier than the event before it",
                index
            )));
        }

        debug!(event_count = loaded.len(), "Macro loaded");

        Ok(loaded)
    }

    /// Names of all stored macros.
    ///
    /// The directory is read when this is called and entries are yielded
    /// lazily, so each call reflects the current contents. Order is the
    /// directory's order.
    #[track_caller]
    pub fn list(&self) -> CoreResult<impl Iterator<Item = String> + use<>> {
        let entries = fs::read_dir(&self.dir)?;

        Ok(entries.filter_map(|entry| {
            let path = entry.ok()?.path();
            if !path.is_file() {
                return None;
            }
            if path.extension()? != MACRO_EXTENSION {
                return None;
            }
            let name = path.file_stem()?.to_str()?;
            validate_name(name).ok()?;
            Some(name.to_string())
        }))
    }

    /// Delete the macro called `name`.
    ///
    /// # Errors
    ///
    /// `NotFound` if no document exists.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn delete(&self, name: &str) -> CoreResult<()> {
        let path = self.path_for(name)?;

        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = ?path, "Macro deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(MacroError::NotFound {
                name: name.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

fn write_synced(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[track_caller]
fn validate_name(name: &str) -> CoreResult<()> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.len() > MAX_NAME_LEN {
        "name is too long"
    } else if name.starts_with('.') {
        "name starts with a dot"
    } else if name.contains(['/', '\\']) {
        "name contains a path separator"
    } else if name.chars().any(char::is_control) {
        "name contains control characters"
    } else {
        return Ok(());
    };

    Err(MacroError::InvalidMacroName {
        name: name.to_string(),
        reason,
        location: ErrorLocation::from(Location::caller()),
    })
}
