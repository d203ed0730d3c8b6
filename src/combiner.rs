//! Attach signatures to an unsigned body.

use crate::address::{byron, parse_address, Era};
use crate::builder::check_body;
use crate::error::{Error, Result};
use crate::tx;
use cml_chain::auxdata::AuxiliaryData;
use cml_chain::byron::AddrAttributes;
use cml_chain::crypto::{BootstrapWitness, Vkeywitness};
use cml_core::serialization::Deserialize;
use cml_crypto::{Ed25519Signature, PublicKey, RawBytesEncoding};

/// One signature over the body hash, in hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    pub public_key: String,
    pub signature: String,
    /// Required when `address` is a Byron address.
    pub chain_code: Option<String>,
    pub address: Option<String>,
}

/// Serialize `[body, witness_set, true, aux | null]`, keeping the body bytes as given.
pub fn combine(
    unsigned_body: &[u8],
    witnesses: &[Witness],
    auxiliary_data: Option<&[u8]>,
) -> Result<Vec<u8>> {
    let body = check_body(unsigned_body)?;
    let auxiliary_data = auxiliary_data
        .map(AuxiliaryData::from_cbor_bytes)
        .transpose()
        .map_err(|e| {
            tracing::error!(error = %e, "cannot decode auxiliary data");
            Error::CantCreateSignTransaction
        })?;

    let mut vkeys = Vec::new();
    let mut bootstraps = Vec::new();
    for witness in witnesses {
        let vkey = decode_raw::<PublicKey>(&witness.public_key, "public key")?;
        let signature = decode_raw::<Ed25519Signature>(&witness.signature, "signature")?;
        match byron_attributes(witness.address.as_deref()) {
            Some(attributes) => {
                let chain_code = witness
                    .chain_code
                    .as_deref()
                    .filter(|c| !c.is_empty())
                    .ok_or(Error::ChainCodeMissing)?;
                let chain_code = hex::decode(chain_code).map_err(|e| {
                    Error::CantBuildWitnessesSet(format!("Invalid chain code {chain_code}: {e}"))
                })?;
                let bootstrap = BootstrapWitness::new(vkey, signature, chain_code, attributes)
                    .map_err(|e| Error::CantBuildWitnessesSet(e.to_string()))?;
                bootstraps.push(bootstrap);
            }
            None => vkeys.push(Vkeywitness::new(vkey, signature)),
        }
    }
    tracing::info!(
        vkeys = vkeys.len(),
        bootstraps = bootstraps.len(),
        "building signed transaction"
    );
    Ok(tx::assemble(
        body,
        tx::witness_set(vkeys, bootstraps),
        auxiliary_data,
    ))
}

/// Attributes of a Byron signer, `None` for anything else.
fn byron_attributes(address: Option<&str>) -> Option<AddrAttributes> {
    let address = address?;
    match parse_address(address).ok()?.era {
        Era::Byron => byron::decode(address)
            .ok()
            .map(|a| a.content.addr_attributes),
        Era::Shelley => None,
    }
}

fn decode_raw<T: RawBytesEncoding>(text: &str, what: &str) -> Result<T> {
    let bytes = hex::decode(text)
        .map_err(|e| Error::CantBuildWitnessesSet(format!("Invalid {what} {text}: {e}")))?;
    T::from_raw_bytes(&bytes)
        .map_err(|e| Error::CantBuildWitnessesSet(format!("Invalid {what} {text}: {e}")))
}
