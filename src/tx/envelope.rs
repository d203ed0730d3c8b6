//! The Rosetta transaction wrapper `[tx_hex, extra_data]`.
//!
//! Raw Cardano bytes cannot carry input amounts or staking keys, so payloads
//! wraps the transaction together with the operations needed to rebuild them.

use crate::error::{Error, Result};
use crate::intent::OperationType;
use crate::model::{CoinAction, Operation};
use ciborium::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraData {
    #[serde(default)]
    pub operations: Vec<Operation>,
    #[serde(
        rename = "transactionMetadataHex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub transaction_metadata_hex: Option<String>,
}

impl ExtraData {
    /// Keep only the operations the parser needs: spent inputs, staking, pool
    /// and vote operations.
    pub fn from_operations(operations: &[Operation], aux_data: Option<&[u8]>) -> Self {
        let operations = operations
            .iter()
            .filter(|op| {
                let spent = op
                    .coin_change
                    .as_ref()
                    .is_some_and(|c| c.coin_action == CoinAction::Spent);
                let kind = op.kind.parse::<OperationType>().ok();
                spent || kind.is_some_and(|k| k.is_staking() || k.is_pool() || k.is_vote())
            })
            .cloned()
            .collect();
        ExtraData {
            operations,
            transaction_metadata_hex: aux_data.map(hex::encode),
        }
    }

    pub fn operations_of(&self, kind: OperationType) -> impl Iterator<Item = &Operation> {
        self.operations
            .iter()
            .filter(move |op| op.kind.parse::<OperationType>().ok() == Some(kind))
    }

    pub fn aux_data(&self) -> Result<Option<Vec<u8>>> {
        self.transaction_metadata_hex
            .as_deref()
            .filter(|h| !h.is_empty())
            .map(|h| hex::decode(h).map_err(|_| Error::InvalidTransaction))
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Hex of the body map (unsigned) or the full transaction array (signed).
    pub tx_hex: String,
    pub extra: ExtraData,
}

impl Envelope {
    pub fn new(tx_bytes: &[u8], extra: ExtraData) -> Self {
        Envelope {
            tx_hex: hex::encode(tx_bytes),
            extra,
        }
    }

    /// Hex of the CBOR array `[tx_hex, extra_data]`.
    pub fn encode(&self) -> Result<String> {
        let mut buf = Vec::new();
        ciborium::into_writer(&(&self.tx_hex, &self.extra), &mut buf)
            .map_err(|e| Error::Unspecified(format!("Cannot encode transaction wrapper: {e}")))?;
        Ok(hex::encode(buf))
    }

    pub fn decode(packed_hex: &str) -> Result<Self> {
        let bytes = hex::decode(packed_hex.trim()).map_err(|_| Error::InvalidTransaction)?;
        let value: Value =
            ciborium::from_reader(bytes.as_slice()).map_err(|_| Error::InvalidTransaction)?;
        let Value::Array(items) = peel(value) else {
            return Err(Error::InvalidTransaction);
        };
        let mut items = items.into_iter();
        let Some(Value::Text(tx_hex)) = items.next() else {
            return Err(Error::InvalidTransaction);
        };
        let extra = match items.next() {
            None | Some(Value::Null) => ExtraData::default(),
            Some(v) => v.deserialized::<ExtraData>().map_err(|e| {
                tracing::debug!(error = %e, "malformed extra data");
                Error::InvalidTransaction
            })?,
        };
        Ok(Envelope { tx_hex, extra })
    }

    pub fn tx_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.tx_hex).map_err(|_| Error::InvalidTransaction)
    }
}

/// Strip one-element outer arrays around a wrapper, as in `[[tx_hex, extra]]`.
fn peel(value: Value) -> Value {
    match value {
        Value::Array(mut items) if matches!(items.as_slice(), [Value::Array(_)]) => {
            peel(items.remove(0))
        }
        other => other,
    }
}

/// The `tx_hex` of a wrapper, `None` when `bytes` are not one.
pub(crate) fn wrapped_tx_hex(bytes: &[u8]) -> Result<Option<String>> {
    let Ok(value) = ciborium::from_reader::<Value, _>(bytes) else {
        return Ok(None);
    };
    match peel(value) {
        Value::Array(items) if items.is_empty() => Err(Error::InvalidTransaction),
        Value::Array(items) => match items.into_iter().next() {
            Some(Value::Text(tx_hex)) => Ok(Some(tx_hex)),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}
