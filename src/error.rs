use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("No node matches {0:?}")]
    UnknownNode(String),
    #[error("Document contains no features")]
    EmptyDocument,
    #[error("Nothing to save to {0}")]
    NothingToSave(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
