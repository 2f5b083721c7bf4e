//! Dump failures.

use std::path::PathBuf;
use thiserror::Error;

/// Why a dump did not complete.
#[derive(Error, Debug)]
pub enum DumpError {
    /// The uniquely named output file could not be created.
    #[error("failed to create snapshot file in {dir}: {source}")]
    Create {
        /// Directory the file was to be created in.
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A write to the output file failed; the partial file is left in place.
    #[error("failed writing snapshot {path}: {source}")]
    Write {
        /// The partially written file.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DumpError>;
