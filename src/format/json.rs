//! JSON output formatting.

use crate::error::{Error, Result};
use serde::Serialize;

/// Format a response document as pretty-printed JSON.
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::FormatError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::api::{TransactionIdentifier, TransactionIdentifierResponse};

    #[test]
    fn test_format_identifier() {
        let response = TransactionIdentifierResponse {
            transaction_identifier: TransactionIdentifier {
                hash: "ab".repeat(32),
            },
        };
        let output = format_json(&response).unwrap();
        let back: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(back["transaction_identifier"]["hash"], "ab".repeat(32));
    }

    #[test]
    fn test_format_error_object() {
        let output = format_json(&crate::Error::OutputsExceedInputs.to_rosetta()).unwrap();
        assert!(output.contains("\"code\": 4010"));
        assert!(output.contains("\"retriable\": false"));
    }
}
