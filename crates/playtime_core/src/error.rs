//! Error types for the playtime core

use std::{io::Error as IoError, path::PathBuf};
use thiserror::Error;

/// Persistence errors for the identity cache, the daily snapshot and stat files
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read directory {0}: {1}")]
    DirectoryRead(PathBuf, IoError),

    #[error("Failed to create directory {0}: {1}")]
    DirectoryCreate(PathBuf, IoError),

    #[error("Failed to read file {0}: {1}")]
    FileRead(PathBuf, IoError),

    #[error("Failed to write to file {0}: {1}")]
    FileWrite(PathBuf, IoError),

    #[error("Failed to rename file from {0} to {1}: {2}")]
    FileRename(PathBuf, PathBuf, IoError),

    #[error("Failed to serialize {0}: {1}")]
    Serialization(PathBuf, serde_json::Error),

    #[error("Failed to deserialize file {0}: {1}")]
    Deserialization(PathBuf, serde_json::Error),

    #[error("File name {0} is not a player identifier")]
    InvalidFileName(PathBuf),
}

/// Remote directory lookup errors
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Directory request failed: {0}")]
    Transport(String),

    #[error("Directory request timed out after {0} ms")]
    Timeout(u64),

    #[error("Directory returned HTTP {0}")]
    Status(u16),

    #[error("Malformed directory response: {0}")]
    MalformedBody(String),
}

/// Reset time parsing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResetTimeError {
    #[error("Expected HH:MM:SS, got {0} segment(s)")]
    SegmentCount(usize),

    #[error("Segment '{0}' is not a number")]
    NotNumeric(String),

    #[error("Segment '{0}' must be exactly two digits")]
    SegmentWidth(String),

    #[error("{field} value {value} is out of range")]
    OutOfRange { field: &'static str, value: u32 },
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {0}: {1}")]
    Read(PathBuf, IoError),

    #[error("Failed to write config {0}: {1}")]
    Write(PathBuf, IoError),

    #[error("Failed to parse config {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
pub type DirectoryResult<T> = Result<T, DirectoryError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
