//! Rosetta operation objects.

use super::metadata::OperationMetadata;
use serde::{Deserialize, Serialize};

pub const ADA: &str = "ADA";
pub const ADA_DECIMALS: u32 = 6;

/// Operation status for operations reconstructed from a signed transaction.
pub const STATUS_SUCCESS: &str = "success";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationIdentifier {
    pub index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_index: Option<u64>,
}

impl OperationIdentifier {
    pub fn new(index: u64) -> Self {
        OperationIdentifier {
            index,
            network_index: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentifierMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentifier {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AccountIdentifierMetadata>,
}

impl AccountIdentifier {
    pub fn new(address: impl Into<String>) -> Self {
        AccountIdentifier {
            address: address.into(),
            metadata: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyMetadata {
    #[serde(rename = "policyId")]
    pub policy_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub symbol: String,
    pub decimals: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CurrencyMetadata>,
}

impl Currency {
    pub fn ada() -> Self {
        Currency {
            symbol: ADA.to_string(),
            decimals: ADA_DECIMALS,
            metadata: None,
        }
    }

    /// Native token currency; the symbol is the hex asset name.
    pub fn token(symbol: impl Into<String>) -> Self {
        Currency {
            symbol: symbol.into(),
            decimals: 0,
            metadata: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// Signed decimal string.
    pub value: String,
    pub currency: Currency,
}

impl Amount {
    pub fn lovelace(value: impl ToString) -> Self {
        Amount {
            value: value.to_string(),
            currency: Currency::ada(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoinAction {
    #[serde(rename = "coin_spent")]
    Spent,
    #[serde(rename = "coin_created")]
    Created,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinIdentifier {
    /// `"<tx hash>:<output index>"`.
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinChange {
    pub coin_identifier: CoinIdentifier,
    pub coin_action: CoinAction,
}

impl CoinChange {
    pub fn spent(identifier: impl Into<String>) -> Self {
        CoinChange {
            coin_identifier: CoinIdentifier {
                identifier: identifier.into(),
            },
            coin_action: CoinAction::Spent,
        }
    }
}

/// A Rosetta operation. `kind` is kept as text so unknown types surface as a
/// Rosetta error instead of a JSON error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub operation_identifier: OperationIdentifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_operations: Option<Vec<OperationIdentifier>>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin_change: Option<CoinChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<OperationMetadata>,
}

impl Operation {
    pub fn new(index: u64, kind: impl Into<String>) -> Self {
        Operation {
            operation_identifier: OperationIdentifier::new(index),
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn account_address(&self) -> Option<&str> {
        self.account
            .as_ref()
            .map(|a| a.address.as_str())
            .filter(|a| !a.is_empty())
    }

    pub fn amount_value(&self) -> Option<&str> {
        self.amount.as_ref().map(|a| a.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_json_shape() {
        let json = r#"{
            "operation_identifier": {"index": 0, "network_index": 0},
            "type": "input",
            "status": "success",
            "account": {"address": "addr1vxa5pudxg77g3sdaddecmw8tvc6hmynywn49lltt4fmvn7cpnkcpx"},
            "amount": {"value": "-90000", "currency": {"symbol": "ADA", "decimals": 6}},
            "coin_change": {
                "coin_identifier": {"identifier": "2f23fd8cca835af21f3ac375bac601f97ead75f2e79143bdf71fe2c4be043e8f:1"},
                "coin_action": "coin_spent"
            }
        }"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        assert_eq!(op.kind, "input");
        assert_eq!(op.amount_value(), Some("-90000"));
        assert_eq!(
            op.coin_change.as_ref().map(|c| c.coin_action),
            Some(CoinAction::Spent)
        );

        let back = serde_json::to_value(&op).unwrap();
        assert_eq!(back["coin_change"]["coin_action"], "coin_spent");
        assert!(back.get("related_operations").is_none());
    }
}
