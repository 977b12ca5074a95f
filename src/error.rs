use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum SkripsiError {
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Invalid command: {0}")]
    Command(String),
    #[error("File system error: {0}")]
    Io(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("(De)serialization error: {0}")]
    Serialization(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<JsonError> for SkripsiError {
    fn from(src: JsonError) -> SkripsiError {
        SkripsiError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<uuid::Error> for SkripsiError {
    fn from(src: uuid::Error) -> SkripsiError {
        SkripsiError::Serialization(format!("UUID conversion failed: {src}"))
    }
}

impl From<io::Error> for SkripsiError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => SkripsiError::NotFound(format!("{x}")),
            _ => SkripsiError::Io(format!("IOError: {}", x.kind())),
        }
    }
}
