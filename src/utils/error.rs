// src/utils/error.rs
#![allow(dead_code)]
use thiserror::Error;

// Define specific error types for different parts of the application.
// Note that "section not found" is deliberately NOT an error anywhere: a
// document without a qualifying section is an ordinary empty outcome.
#[derive(Error, Debug)]
pub enum EdgarError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 404 Not Found, 403 Forbidden

    #[error("SEC Rate limit likely exceeded")]
    RateLimited,

    #[error("Could not locate company info for CIK {0}, is it a valid CIK?")]
    CompanyNotFound(String),

    #[error("Could not find specified filing document: {0}")]
    FilingDocNotFound(String),

    #[error("Failed to parse EDGAR response: {0}")]
    Parse(String),

    #[error("I/O error while saving download: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    // Malformed phrase sets / entity patterns are a configuration error,
    // caught once at registry construction.
    #[error("Pattern compilation failed: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Table serialization failed: {0}")]
    TableSerialize(String),

    #[error("Failed to read index file: {0}")]
    Index(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("EDGAR interaction failed: {0}")]
    Edgar(#[from] EdgarError), // Automatically convert Edgar errors

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
