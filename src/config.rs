//! Protocol parameters and deposit configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_KEY_DEPOSIT: u64 = 2_000_000;
pub const DEFAULT_POOL_DEPOSIT: u64 = 500_000_000;
pub const DEFAULT_RELATIVE_TTL: u64 = 1000;

/// Ledger parameters the construction flows read but never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    #[serde(alias = "minFeeCoefficient")]
    pub min_fee_a: u64,
    #[serde(alias = "minFeeConstant")]
    pub min_fee_b: u64,
    #[serde(alias = "maxTxSize")]
    pub max_tx_size: u64,
    #[serde(alias = "keyDeposit", deserialize_with = "de_u64_or_string")]
    pub key_deposit: u64,
    #[serde(alias = "poolDeposit", deserialize_with = "de_u64_or_string")]
    pub pool_deposit: u64,
    #[serde(alias = "coinsPerUtxoSize", deserialize_with = "de_u64_or_string")]
    pub coins_per_utxo_byte: u64,
    #[serde(alias = "maxValSize", deserialize_with = "de_u64_or_string")]
    pub max_value_size: u64,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        ProtocolParams {
            min_fee_a: 44,
            min_fee_b: 155_381,
            max_tx_size: 16_384,
            key_deposit: DEFAULT_KEY_DEPOSIT,
            pool_deposit: DEFAULT_POOL_DEPOSIT,
            coins_per_utxo_byte: 4_310,
            max_value_size: 5_000,
        }
    }
}

impl ProtocolParams {
    /// Load parameters from a JSON file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(ProtocolParams::default());
        };
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| Error::IoError {
            path: Some(path.to_path_buf()),
            source: e,
        })?;
        let params: ProtocolParams = serde_json::from_str(&text)?;
        tracing::debug!(path = %path.display(), ?params, "loaded protocol parameters");
        Ok(params)
    }

    pub fn deposits(&self) -> Deposits {
        Deposits {
            key_deposit: self.key_deposit,
            pool_deposit: self.pool_deposit,
        }
    }
}

/// Deposit amounts as they appear in request metadata (decimal strings).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositParameters {
    #[serde(rename = "keyDeposit", default, skip_serializing_if = "Option::is_none")]
    pub key_deposit: Option<String>,
    #[serde(rename = "poolDeposit", default, skip_serializing_if = "Option::is_none")]
    pub pool_deposit: Option<String>,
}

/// Resolved deposit amounts in lovelace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deposits {
    pub key_deposit: u64,
    pub pool_deposit: u64,
}

impl Default for Deposits {
    fn default() -> Self {
        Deposits {
            key_deposit: DEFAULT_KEY_DEPOSIT,
            pool_deposit: DEFAULT_POOL_DEPOSIT,
        }
    }
}

impl Deposits {
    /// Resolve request deposit parameters, falling back to `fallback` per field.
    pub fn resolve(params: Option<&DepositParameters>, fallback: Deposits) -> Result<Self> {
        let Some(params) = params else {
            return Ok(fallback);
        };
        let parse = |value: &Option<String>, default: u64, what: &str| -> Result<u64> {
            match value {
                None => Ok(default),
                Some(v) => v
                    .parse::<u64>()
                    .map_err(|_| Error::Unspecified(format!("Invalid {what}: {v}"))),
            }
        };
        Ok(Deposits {
            key_deposit: parse(&params.key_deposit, fallback.key_deposit, "keyDeposit")?,
            pool_deposit: parse(&params.pool_deposit, fallback.pool_deposit, "poolDeposit")?,
        })
    }
}

fn de_u64_or_string<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let params = ProtocolParams::load(None).unwrap();
        assert_eq!(params.key_deposit, 2_000_000);
        assert_eq!(params.min_fee_a, 44);
    }

    #[test]
    fn test_load_node_style_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"minFeeCoefficient": 45, "minFeeConstant": 155000, "keyDeposit": "3000000", "coinsPerUtxoSize": "4310"}}"#
        )
        .unwrap();
        let params = ProtocolParams::load(Some(file.path())).unwrap();
        assert_eq!(params.min_fee_a, 45);
        assert_eq!(params.min_fee_b, 155_000);
        assert_eq!(params.key_deposit, 3_000_000);
        assert_eq!(params.pool_deposit, DEFAULT_POOL_DEPOSIT);
    }

    #[test]
    fn test_load_missing_file() {
        let result = ProtocolParams::load(Some(Path::new("/nonexistent/params.json")));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_resolve_deposits() {
        let params = DepositParameters {
            key_deposit: Some("1000".into()),
            pool_deposit: None,
        };
        let deposits = Deposits::resolve(Some(&params), Deposits::default()).unwrap();
        assert_eq!(deposits.key_deposit, 1000);
        assert_eq!(deposits.pool_deposit, DEFAULT_POOL_DEPOSIT);

        let bad = DepositParameters {
            key_deposit: Some("abc".into()),
            pool_deposit: None,
        };
        assert!(Deposits::resolve(Some(&bad), Deposits::default()).is_err());
    }
}
