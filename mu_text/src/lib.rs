#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Text scripts stored in zip archives.
//!
//! Archives are written on different platforms, so entry names use either
//! `/` or `\` as the separator. [`TextArchive::read_entry`] accepts both.

mod script;

pub use script::{Script, ScriptLine};

use std::{
    fs::File,
    io::{self, Read, Seek},
    path::{Path, PathBuf},
    result,
};

use thiserror::Error;
use tracing::debug;
use zip::{result::ZipError, ZipArchive};

#[derive(Debug, Clone, Error, Hash, PartialEq, Eq)]
pub enum Error {
    #[error("entry `{0}` not found in archive")]
    EntryNotFound(String),
    #[error("archive error: {0}")]
    Archive(String),
    #[error("io error reading `{path}`: {error}")]
    Io { path: PathBuf, error: String },
    #[error("script is not valid ISO 8859-1: {0}")]
    Encoding(String),
    #[error("invalid script on line {line}: {reason}")]
    InvalidScript { line: usize, reason: String },
}

impl Error {
    fn from_io(err: &io::Error, path: &Path) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            error: err.to_string(),
        }
    }
}

impl From<ZipError> for Error {
    fn from(err: ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Spellings of an entry path to try, in order, without duplicates.
fn entry_candidates(path: &str) -> Vec<String> {
    let mut candidates = vec![path.to_owned()];
    for candidate in [path.replace('/', "\\"), path.replace('\\', "/")] {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

fn normalize_entry(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_owned()
}

pub struct TextArchive<R> {
    archive: ZipArchive<R>,
}

impl TextArchive<File> {
    /// Opens the archive at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the file can't be opened or isn't a zip archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| Error::from_io(&err, path))?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> TextArchive<R> {
    /// # Errors
    ///
    /// Returns `Err` if `reader` doesn't contain a zip archive.
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        debug!(entries = archive.len(), "opened text archive");
        Ok(Self { archive })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Names of all entries as stored in the archive.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.archive.file_names()
    }

    /// Returns the name an entry is stored under, trying both separators.
    ///
    /// If no spelling matches exactly, falls back to comparing normalized names,
    /// ignoring leading separators and ASCII case.
    #[must_use]
    pub fn find_entry(&self, path: &str) -> Option<String> {
        if let Some(name) = entry_candidates(path)
            .into_iter()
            .find(|candidate| self.archive.index_for_name(candidate).is_some())
        {
            return Some(name);
        }

        let wanted = normalize_entry(path);
        self.archive
            .file_names()
            .find(|name| normalize_entry(name).eq_ignore_ascii_case(&wanted))
            .map(str::to_owned)
    }

    /// Reads the uncompressed contents of an entry.
    ///
    /// # Errors
    ///
    /// Returns `Err` if no spelling of `path` exists or the entry can't be extracted.
    pub fn read_entry(&mut self, path: &str) -> Result<Vec<u8>> {
        let name = self
            .find_entry(path)
            .ok_or_else(|| Error::EntryNotFound(path.to_owned()))?;

        debug!(path, %name, "reading archive entry");

        let mut file = self.archive.by_name(&name)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|err| Error::from_io(&err, Path::new(&name)))?;
        Ok(bytes)
    }

    /// Reads and tokenizes a script entry.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the entry can't be read or tokenized.
    pub fn read_script(&mut self, path: &str) -> Result<Script> {
        Script::decode(&self.read_entry(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates() {
        assert_eq!(
            entry_candidates("Data/Gate.txt"),
            vec!["Data/Gate.txt", "Data\\Gate.txt"]
        );
        assert_eq!(
            entry_candidates("Data\\Gate.txt"),
            vec!["Data\\Gate.txt", "Data/Gate.txt"]
        );
        assert_eq!(entry_candidates("Gate.txt"), vec!["Gate.txt"]);
    }

    #[test]
    fn normalized_names() {
        assert_eq!(normalize_entry("\\Data\\Gate.txt"), "Data/Gate.txt");
        assert_eq!(normalize_entry("//Gate.txt"), "Gate.txt");
    }
}
