use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Dataset not found: '{}'. Make sure the file is in the working directory or pass --file.", .0.display())]
    MissingInput(PathBuf),

    #[error("Required column '{0}' is missing from the dataset")]
    MissingColumn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DashError>;
