//! Conway transactions on top of CML, plus the Rosetta wrapper.

pub mod envelope;

pub use envelope::{Envelope, ExtraData};

use cml_chain::auxdata::AuxiliaryData;
use cml_chain::crypto::{BootstrapWitness, Vkeywitness};
use cml_chain::transaction::{Transaction, TransactionBody, TransactionWitnessSet};
use cml_core::serialization::{Deserialize, Serialize};
use cml_core::DeserializeError;
use cml_crypto::TransactionHash;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Cbor(#[from] DeserializeError),
    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),
}

/// A bare body or a full `[body, witness_set, is_valid, aux]` transaction.
#[derive(Debug, Clone)]
pub struct DecodedTransaction {
    pub body: TransactionBody,
    /// `None` for a bare body.
    pub witness_set: Option<TransactionWitnessSet>,
    pub auxiliary_data: Option<AuxiliaryData>,
}

impl DecodedTransaction {
    /// Decode either form. Original encodings are kept, so re-serializing
    /// yields the same bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (decoded, consumed) = if is_bare_body(bytes) {
            let body = TransactionBody::from_cbor_bytes(bytes)?;
            let consumed = body.to_cbor_bytes().len();
            let decoded = DecodedTransaction {
                body,
                witness_set: None,
                auxiliary_data: None,
            };
            (decoded, consumed)
        } else {
            let tx = Transaction::from_cbor_bytes(bytes)?;
            let consumed = tx.to_cbor_bytes().len();
            let decoded = DecodedTransaction {
                body: tx.body,
                witness_set: Some(tx.witness_set),
                auxiliary_data: tx.auxiliary_data,
            };
            (decoded, consumed)
        };
        if consumed < bytes.len() {
            return Err(DecodeError::TrailingBytes(bytes.len() - consumed));
        }
        Ok(decoded)
    }

    /// Blake2b-256 of the body bytes.
    pub fn hash(&self) -> TransactionHash {
        self.body.hash()
    }
}

/// Serialize `[body, witness_set, true, aux | null]`.
pub fn assemble(
    body: TransactionBody,
    witness_set: TransactionWitnessSet,
    auxiliary_data: Option<AuxiliaryData>,
) -> Vec<u8> {
    Transaction::new(body, witness_set, true, auxiliary_data).to_cbor_bytes()
}

/// Witness set holding the given witnesses; empty kinds are left out.
pub fn witness_set(
    vkeys: Vec<Vkeywitness>,
    bootstraps: Vec<BootstrapWitness>,
) -> TransactionWitnessSet {
    let mut ws = TransactionWitnessSet::new();
    if !vkeys.is_empty() {
        ws.vkeywitnesses = Some(vkeys.into());
    }
    if !bootstraps.is_empty() {
        ws.bootstrap_witnesses = Some(bootstraps.into());
    }
    ws
}

/// True when `bytes` start with a CBOR map, i.e. a bare transaction body.
pub fn is_bare_body(bytes: &[u8]) -> bool {
    bytes.first().is_some_and(|b| b >> 5 == 5)
}
