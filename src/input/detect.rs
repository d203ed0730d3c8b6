//! Input source detection.

use crate::cli::InputSpec;
use crate::error::{Error, Result};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Resolved input source ready for reading.
#[derive(Debug)]
pub enum InputSource {
    /// Read from a file path.
    File(PathBuf),
    /// Document already in hand.
    Text(String),
    /// Read from stdin.
    Stdin,
}

impl InputSource {
    /// Create an InputSource from an InputSpec.
    pub fn from_spec(spec: &InputSpec) -> Result<Self> {
        match spec {
            InputSpec::Stdin => {
                // Interactive terminal with nothing piped in
                if std::io::stdin().is_terminal() {
                    return Err(Error::NoInput);
                }
                Ok(InputSource::Stdin)
            }

            InputSpec::File(path) => {
                if !path.exists() {
                    return Err(Error::FileNotFound(path.clone()));
                }
                Ok(InputSource::File(path.clone()))
            }

            InputSpec::Inline(text) => Ok(InputSource::Text(text.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_input() {
        let spec = InputSpec::Inline("{}".to_string());
        match InputSource::from_spec(&spec).unwrap() {
            InputSource::Text(t) => assert_eq!(t, "{}"),
            other => panic!("Expected Text, got {other:?}"),
        }
    }

    #[test]
    fn test_file_not_found() {
        let spec = InputSpec::File(PathBuf::from("/nonexistent/request.json"));
        let result = InputSource::from_spec(&spec);
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }
}
