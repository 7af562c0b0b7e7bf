use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed csv in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("no csv sheets found under {0}")]
    EmptyWorkbook(PathBuf),
    #[error("dataset sheet {0} has no header row")]
    MissingHeader(PathBuf),
}

pub type Result<T> = std::result::Result<T, IngestError>;
