//! Catalyst vote registration carried as transaction metadata.
//!
//! Auxiliary data layout: `[{61284: {1: voting_key, 2: stake_key, 3: reward_address,
//! 4: nonce}, 61285: {1: signature}}, []]`.

use crate::address::{encode_address, is_key_valid, parse_address, AddressKind};
use crate::error::{Error, Result};
use crate::model::{PublicKey, VoteRegistrationMetadata};
use cml_chain::auxdata::{
    AuxiliaryData, Metadata, MetadatumMap, ShelleyMAFormatAuxData, TransactionMetadatum,
};
use cml_core::serialization::{Deserialize, Serialize};
use cml_core::Int;

const LABEL_DATA: u64 = 61284;
const LABEL_SIG: u64 = 61285;

const VOTING_KEY: u64 = 1;
const STAKE_KEY: u64 = 2;
const REWARD_ADDRESS: u64 = 3;
const VOTING_NONCE: u64 = 4;
const VOTING_SIGNATURE: u64 = 1;

const SIGNATURE_HEX_LEN: usize = 128;

fn uint(n: u64) -> TransactionMetadatum {
    TransactionMetadatum::new_int(Int::from(n))
}

fn bytes(b: Vec<u8>) -> Result<TransactionMetadatum> {
    TransactionMetadatum::new_bytes(b)
        .map_err(|e| Error::Unspecified(format!("Cannot encode vote metadata: {e}")))
}

/// Validate a vote registration and serialize it as auxiliary data.
pub fn encode_vote_registration(metadata: &VoteRegistrationMetadata) -> Result<Vec<u8>> {
    let voting_key = metadata
        .voting_key
        .as_ref()
        .filter(|k| !k.hex_bytes.is_empty())
        .ok_or(Error::MissingVotingKey)?;
    if !is_key_valid(&voting_key.hex_bytes, &voting_key.curve_type) {
        return Err(Error::InvalidVotingKeyFormat);
    }

    let stake_key = metadata
        .stake_key
        .as_ref()
        .filter(|k| !k.hex_bytes.is_empty())
        .ok_or(Error::MissingStakingKey)?;
    if !is_key_valid(&stake_key.hex_bytes, &stake_key.curve_type) {
        return Err(Error::InvalidStakingKeyFormat);
    }

    let reward_address = metadata
        .reward_address
        .as_deref()
        .ok_or_else(|| Error::InvalidAddress("Missing reward address".to_string()))?;
    let reward = parse_address(reward_address)?;
    if reward.address_type != AddressKind::Reward {
        return Err(Error::InvalidAddress(format!(
            "Vote rewards must go to a stake address: {reward_address}"
        )));
    }

    let nonce = metadata
        .voting_nonce
        .filter(|n| *n > 0)
        .ok_or(Error::VotingNonceNotValid)?;

    let signature = metadata
        .voting_signature
        .as_deref()
        .filter(|s| s.len() == SIGNATURE_HEX_LEN)
        .and_then(|s| hex::decode(s).ok())
        .ok_or(Error::InvalidVotingSignature)?;

    // Keys were checked as 64 hex digits above.
    let key_bytes =
        |key: &PublicKey| hex::decode(&key.hex_bytes).map_err(|_| Error::InvalidPublicKeyFormat);

    let mut data = MetadatumMap::new();
    data.set(uint(VOTING_KEY), bytes(key_bytes(voting_key)?)?);
    data.set(uint(STAKE_KEY), bytes(key_bytes(stake_key)?)?);
    data.set(uint(REWARD_ADDRESS), bytes(reward.bytes)?);
    data.set(uint(VOTING_NONCE), uint(nonce));
    let mut sig = MetadatumMap::new();
    sig.set(uint(VOTING_SIGNATURE), bytes(signature)?);

    let mut labels = Metadata::new();
    labels.set(LABEL_DATA, TransactionMetadatum::new_map(data));
    labels.set(LABEL_SIG, TransactionMetadatum::new_map(sig));
    let aux = AuxiliaryData::new_shelley_ma(ShelleyMAFormatAuxData::new(labels, vec![]));
    Ok(aux.to_cbor_bytes())
}

fn lookup(map: &MetadatumMap, key: u64) -> Option<&TransactionMetadatum> {
    map.get(&uint(key))
}

fn as_u64(datum: &TransactionMetadatum) -> Option<u64> {
    match datum.as_int()? {
        Int::Uint { value, .. } => Some(*value),
        Int::Nint { .. } => None,
    }
}

/// Rebuild vote registration metadata from serialized auxiliary data.
pub fn decode_vote_registration(aux_data: &[u8]) -> Result<VoteRegistrationMetadata> {
    let aux = AuxiliaryData::from_cbor_bytes(aux_data)
        .map_err(|e| Error::Unspecified(format!("Invalid vote metadata: {e}")))?;
    let metadata = aux.metadata().ok_or(Error::MissingVoteRegistrationMetadata)?;

    let data = metadata
        .get(LABEL_DATA)
        .and_then(TransactionMetadatum::as_map)
        .ok_or(Error::MissingVoteRegistrationMetadata)?;
    let sig = metadata
        .get(LABEL_SIG)
        .and_then(TransactionMetadatum::as_map)
        .and_then(|m| lookup(m, VOTING_SIGNATURE))
        .and_then(TransactionMetadatum::as_bytes)
        .ok_or(Error::InvalidVotingSignature)?;

    let key = |index: u64, missing: Error| -> Result<PublicKey> {
        lookup(data, index)
            .and_then(TransactionMetadatum::as_bytes)
            .map(|b| PublicKey::edwards25519(hex::encode(b)))
            .ok_or(missing)
    };
    let reward_address = lookup(data, REWARD_ADDRESS)
        .and_then(TransactionMetadatum::as_bytes)
        .ok_or_else(|| Error::InvalidAddress("Missing vote reward address".to_string()))?;
    let nonce = lookup(data, VOTING_NONCE)
        .and_then(as_u64)
        .ok_or(Error::VotingNonceNotValid)?;

    Ok(VoteRegistrationMetadata {
        stake_key: Some(key(STAKE_KEY, Error::MissingStakingKey)?),
        voting_key: Some(key(VOTING_KEY, Error::MissingVotingKey)?),
        reward_address: Some(encode_address(reward_address)?),
        voting_nonce: Some(nonce),
        voting_signature: Some(hex::encode(sig)),
    })
}
