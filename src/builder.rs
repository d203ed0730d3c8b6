//! Unsigned transaction assembly and size estimation.

use crate::address::{byron, is_ed25519_key_hash, parse_address, Era};
use crate::config::{Deposits, ProtocolParams};
use crate::crypto::hash256;
use crate::error::{Error, Result};
use crate::fee::compute_fee;
use crate::intent::{parse_operations, TransactionIntent};
use crate::model::Operation;
use crate::network::Network;
use crate::tx;
use cml_chain::auxdata::AuxiliaryData;
use cml_chain::crypto::{BootstrapWitness, Vkeywitness};
use cml_chain::transaction::{TransactionBody, TransactionWitnessSet};
use cml_core::serialization::{Deserialize, Serialize};
use cml_crypto::{AuxiliaryDataHash, Ed25519Signature, PublicKey, RawBytesEncoding};

const PLACEHOLDER_KEY: [u8; 32] = [0; 32];
const PLACEHOLDER_SIGNATURE: [u8; 64] = [0; 64];
const PLACEHOLDER_CHAIN_CODE: [u8; 32] = [0; 32];

/// Body bytes ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub body_hash: [u8; 32],
    pub cbor_bytes: Vec<u8>,
    /// Sorted and deduplicated.
    pub required_signer_addresses: Vec<String>,
    pub auxiliary_data_bytes: Option<Vec<u8>>,
}

impl UnsignedTransaction {
    pub fn body_hash_hex(&self) -> String {
        hex::encode(self.body_hash)
    }
}

/// Parse the operations, check the fee and serialize the body.
///
/// Deposits default to the ones in `params`.
pub fn build(
    network: Network,
    operations: &[Operation],
    ttl: u64,
    params: &ProtocolParams,
    deposits: Option<Deposits>,
) -> Result<UnsignedTransaction> {
    tracing::info!(operations = operations.len(), ttl, "creating unsigned transaction");
    let deposits = deposits.unwrap_or_else(|| params.deposits());
    let intent = parse_operations(operations, network)?;
    let fee = compute_fee(
        &intent.input_amounts,
        &intent.output_amounts,
        &intent.withdrawal_amounts,
        intent.deposit_totals(deposits),
    )?;
    Ok(assemble(intent, fee, ttl))
}

fn assemble(intent: TransactionIntent, fee: u64, ttl: u64) -> UnsignedTransaction {
    let TransactionIntent {
        inputs,
        outputs,
        certs,
        withdrawals,
        signers,
        auxiliary_data,
        ..
    } = intent;

    let mut body = TransactionBody::new(inputs.into(), outputs, fee);
    body.ttl = Some(ttl);
    if !certs.is_empty() {
        body.certs = Some(certs.into());
    }
    if !withdrawals.is_empty() {
        body.withdrawals = Some(withdrawals);
    }
    body.auxiliary_data_hash = auxiliary_data
        .as_deref()
        .map(|aux| AuxiliaryDataHash::from(hash256(aux)));

    let cbor_bytes = body.to_cbor_bytes();
    tracing::debug!(fee, signers = signers.len(), bytes = cbor_bytes.len(), "body assembled");

    UnsignedTransaction {
        body_hash: hash256(&cbor_bytes),
        cbor_bytes,
        required_signer_addresses: signers.into_iter().collect(),
        auxiliary_data_bytes: auxiliary_data,
    }
}

/// Size in bytes of the signed transaction once every required signer has
/// added a witness.
pub fn estimate_size(
    network: Network,
    operations: &[Operation],
    ttl: u64,
    deposits: Option<Deposits>,
) -> Result<u64> {
    let unsigned = build(
        network,
        operations,
        ttl,
        &ProtocolParams::default(),
        deposits,
    )?;
    let body = TransactionBody::from_cbor_bytes(&unsigned.cbor_bytes)
        .map_err(|_| Error::CantCreateUnsignedTransaction)?;
    let auxiliary_data = unsigned
        .auxiliary_data_bytes
        .as_deref()
        .map(AuxiliaryData::from_cbor_bytes)
        .transpose()
        .map_err(|_| Error::CantCreateUnsignedTransaction)?;
    let witnesses = placeholder_witnesses(&unsigned.required_signer_addresses)?;
    let signed = tx::assemble(body, witnesses, auxiliary_data);
    tracing::debug!(size = signed.len(), "estimated transaction size");
    Ok(signed.len() as u64)
}

fn placeholder_witnesses(signers: &[String]) -> Result<TransactionWitnessSet> {
    let key = PublicKey::from_raw_bytes(&PLACEHOLDER_KEY)
        .map_err(|_| Error::CantCreateUnsignedTransaction)?;
    let signature = Ed25519Signature::from_raw_bytes(&PLACEHOLDER_SIGNATURE)
        .map_err(|_| Error::CantCreateUnsignedTransaction)?;

    let mut vkeys = Vec::new();
    let mut bootstraps = Vec::new();
    for signer in signers {
        match parse_address(signer).map(|a| a.era) {
            Ok(Era::Byron) => match byron::decode(signer) {
                Ok(addr) => bootstraps.push(
                    BootstrapWitness::new(
                        key.clone(),
                        signature.clone(),
                        PLACEHOLDER_CHAIN_CODE.to_vec(),
                        addr.content.addr_attributes,
                    )
                    .map_err(|_| Error::CantCreateUnsignedTransaction)?,
                ),
                Err(e) => tracing::warn!(signer, error = %e, "skipping signer"),
            },
            Ok(Era::Shelley) => vkeys.push(Vkeywitness::new(key.clone(), signature.clone())),
            Err(_) if is_ed25519_key_hash(signer) => {
                vkeys.push(Vkeywitness::new(key.clone(), signature.clone()))
            }
            Err(_) => tracing::warn!(signer, "signer is neither an address nor a pool key hash"),
        }
    }
    Ok(tx::witness_set(vkeys, bootstraps))
}

/// Adjust a size estimated with `previous_ttl` for the CBOR width of `new_ttl`.
pub fn update_tx_size(size: u64, previous_ttl: u64, new_ttl: u64) -> u64 {
    size + uint_width(new_ttl) - uint_width(previous_ttl)
}

/// Encoded length of a CBOR unsigned integer.
fn uint_width(n: u64) -> u64 {
    match n {
        0..=23 => 1,
        24..=0xff => 2,
        0x100..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Linear fee `a * size + b`, saturating at `u64::MAX`.
pub fn min_fee(size: u64, params: &ProtocolParams) -> u64 {
    params
        .min_fee_a
        .saturating_mul(size)
        .saturating_add(params.min_fee_b)
}

/// Body bytes must decode as a transaction body.
pub(crate) fn check_body(body: &[u8]) -> Result<TransactionBody> {
    TransactionBody::from_cbor_bytes(body).map_err(|e| {
        tracing::error!(error = %e, "cannot decode transaction body");
        Error::CantCreateSignTransaction
    })
}
