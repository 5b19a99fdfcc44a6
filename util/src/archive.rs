//! Struct archiving functionality
//!
//! Records are written as CSV rows through an `Archiver`, one file per archive.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
#[derive(Default)]
pub struct Archiver {
    writer: Option<Writer<File>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while archiving.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Cannot create the archive file: {0}")]
    FileCreateError(std::io::Error),

    #[error("Cannot write the record: {0}")]
    WriteError(csv::Error),

    #[error("Cannot flush the archive: {0}")]
    FlushError(std::io::Error),

    #[error("The archiver has not been initialised")]
    NotInit,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    pub fn from_path<P: AsRef<Path>>(session: &Session, path: P) -> Result<Self, ArchiveError> {
        Self::from_abs_path(session.arch_root.join(path))
    }

    /// Create a new archiver writing to the given path, truncating any existing file.
    pub fn from_abs_path<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let file = File::create(path).map_err(ArchiveError::FileCreateError)?;

        let w = WriterBuilder::new().has_headers(true).from_writer(file);

        Ok(Self { writer: Some(w) })
    }

    /// Serialise a record into the archive.
    pub fn serialise<T: Serialize>(&mut self, record: T) -> Result<(), ArchiveError> {
        match self.writer {
            Some(ref mut w) => {
                w.serialize(record).map_err(ArchiveError::WriteError)?;
                w.flush().map_err(ArchiveError::FlushError)
            }
            None => Err(ArchiveError::NotInit),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Row {
        time_s: f64,
        clearance_m: f64,
    }

    #[test]
    fn test_uninit_archiver() {
        let mut a = Archiver::default();
        match a.serialise(Row {
            time_s: 0.0,
            clearance_m: 1.0,
        }) {
            Err(ArchiveError::NotInit) => (),
            _ => panic!("Expected NotInit"),
        }
    }

    #[test]
    fn test_archive_rows() {
        let path = std::env::temp_dir().join(format!("util_archive_test_{}.csv", std::process::id()));

        let mut a = Archiver::from_abs_path(&path).unwrap();
        a.serialise(Row {
            time_s: 0.0,
            clearance_m: 1.0,
        })
        .unwrap();
        a.serialise(Row {
            time_s: 0.01,
            clearance_m: 0.5,
        })
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["time_s,clearance_m", "0.0,1.0", "0.01,0.5"]);
    }
}
