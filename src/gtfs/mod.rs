use std::io;
use thiserror::Error;

mod config;
pub mod models;
mod parser;
mod records;
mod table;

pub use config::*;
pub use parser::*;
pub use table::TableSummary;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Batch consumer stopped accepting records")]
    SinkClosed,
    #[error("Batch consumer failed: {0}")]
    Sink(String),
}
