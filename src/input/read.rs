//! Input reading implementation.

use crate::cli::InputSpec;
use crate::error::{Error, Result};
use crate::input::InputSource;
use std::fs;
use std::io::{self, Read};

/// A request document: JSON, or a transaction in hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    Json(String),
    Hex(String),
}

/// Read the request document from the specified source.
pub fn read_input(spec: &InputSpec) -> Result<Document> {
    let text = match InputSource::from_spec(spec)? {
        InputSource::File(path) => fs::read_to_string(&path).map_err(|e| Error::IoError {
            path: Some(path),
            source: e,
        })?,

        InputSource::Text(text) => text,

        InputSource::Stdin => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| Error::IoError {
                    path: None,
                    source: e,
                })?;
            buffer
        }
    };
    classify(&text)
}

/// Tell JSON documents from hex transactions.
fn classify(text: &str) -> Result<Document> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(Error::NoInput);
    }

    let hex_candidate = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if hex_candidate.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(Document::Hex(hex_candidate.to_ascii_lowercase()))
    } else {
        Ok(Document::Json(trimmed.to_string()))
    }
}
