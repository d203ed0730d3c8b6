//! Shelley address derivation from Ed25519 public keys.

use super::predicates::is_key_valid;
use super::AddressType;
use crate::crypto::key_hash;
use crate::error::{Error, Result};
use crate::model::PublicKey;
use crate::network::Network;
use cml_chain::address::{Address, BaseAddress, EnterpriseAddress, RewardAccount, RewardAddress};
use cml_chain::certs::Credential;
use cml_crypto::Ed25519KeyHash;

/// Derive an address for `payment_key`.
///
/// Enterprise is used when no type is given. Base and Reward addresses need a
/// staking key.
pub fn derive_address(
    network: Network,
    payment_key: Option<&PublicKey>,
    address_type: Option<AddressType>,
    staking_key: Option<&PublicKey>,
) -> Result<String> {
    let payment_key = payment_key.ok_or(Error::PublicKeyMissing)?;
    let payment = decode_key(payment_key).ok_or(Error::InvalidPublicKeyFormat)?;
    let payment = Credential::new_pub_key(Ed25519KeyHash::from(key_hash(&payment)));

    let address_type = address_type.unwrap_or(AddressType::Enterprise);
    tracing::debug!(%network, ?address_type, "deriving address");

    match address_type {
        AddressType::Base => {
            let staking = staking_key.ok_or(Error::MissingStakingKey)?;
            let stake = decode_key(staking).ok_or(Error::InvalidStakingKeyFormat)?;
            let stake = Credential::new_pub_key(Ed25519KeyHash::from(key_hash(&stake)));
            to_bech32(BaseAddress::new(network.network_id(), payment, stake).to_address())
        }
        AddressType::Enterprise => {
            to_bech32(EnterpriseAddress::new(network.network_id(), payment).to_address())
        }
        AddressType::Reward => {
            let staking = staking_key.ok_or(Error::MissingStakingKey)?;
            reward_address_from_key(network, staking)
        }
    }
}

/// Stake address of a staking public key.
pub fn reward_address_from_key(network: Network, staking_key: &PublicKey) -> Result<String> {
    let stake = decode_key(staking_key).ok_or(Error::InvalidStakingKeyFormat)?;
    reward_address_from_key_hash(network, &Ed25519KeyHash::from(key_hash(&stake)))
}

/// Stake address of a key hash.
pub fn reward_address_from_key_hash(network: Network, hash: &Ed25519KeyHash) -> Result<String> {
    to_bech32(reward_account(network, hash).to_address())
}

/// Stake address of a key or script credential.
pub fn reward_address_from_credential(network: Network, credential: &Credential) -> Result<String> {
    to_bech32(RewardAddress::new(network.network_id(), credential.clone()).to_address())
}

/// Reward account of a key hash, as used in certificates and withdrawals.
pub fn reward_account(network: Network, hash: &Ed25519KeyHash) -> RewardAccount {
    RewardAddress::new(network.network_id(), Credential::new_pub_key(*hash))
}

pub(crate) fn to_bech32(address: Address) -> Result<String> {
    address
        .to_bech32(None)
        .map_err(|e| Error::InvalidAddress(e.to_string()))
}

/// Raw key bytes of a well-formed edwards25519 key.
pub fn decode_key(key: &PublicKey) -> Option<Vec<u8>> {
    if !is_key_valid(&key.hex_bytes, &key.curve_type) {
        return None;
    }
    hex::decode(&key.hex_bytes).ok()
}
