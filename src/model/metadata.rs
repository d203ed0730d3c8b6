//! Type-specific operation metadata.

use super::operation::Amount;
use serde::{Deserialize, Serialize};

pub const CURVE_EDWARDS25519: &str = "edwards25519";

/// Rosetta `PublicKey`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub hex_bytes: String,
    pub curve_type: String,
}

impl PublicKey {
    pub fn edwards25519(hex_bytes: impl Into<String>) -> Self {
        PublicKey {
            hex_bytes: hex_bytes.into(),
            curve_type: CURVE_EDWARDS25519.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundleItem {
    #[serde(rename = "policyId")]
    pub policy_id: String,
    #[serde(default)]
    pub tokens: Vec<Amount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMargin {
    pub numerator: String,
    pub denominator: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMetadata {
    pub url: String,
    pub hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relay {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<String>,
    #[serde(rename = "dnsName", default, skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRegistrationParams {
    #[serde(rename = "vrfKeyHash")]
    pub vrf_key_hash: String,
    #[serde(rename = "rewardAddress")]
    pub reward_address: String,
    pub pledge: String,
    pub cost: String,
    #[serde(rename = "poolOwners", default)]
    pub pool_owners: Vec<String>,
    #[serde(default)]
    pub relays: Vec<Relay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<PoolMargin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_percentage: Option<String>,
    #[serde(rename = "poolMetadata", default, skip_serializing_if = "Option::is_none")]
    pub pool_metadata: Option<PoolMetadata>,
}

/// Catalyst voting registration carried by a `voteRegistration` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRegistrationMetadata {
    #[serde(rename = "stakeKey", default, skip_serializing_if = "Option::is_none")]
    pub stake_key: Option<PublicKey>,
    #[serde(rename = "votingKey", default, skip_serializing_if = "Option::is_none")]
    pub voting_key: Option<PublicKey>,
    #[serde(rename = "rewardAddress", default, skip_serializing_if = "Option::is_none")]
    pub reward_address: Option<String>,
    #[serde(rename = "votingNonce", default, skip_serializing_if = "Option::is_none")]
    pub voting_nonce: Option<u64>,
    #[serde(rename = "votingSignature", default, skip_serializing_if = "Option::is_none")]
    pub voting_signature: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationMetadata {
    #[serde(rename = "withdrawalAmount", default, skip_serializing_if = "Option::is_none")]
    pub withdrawal_amount: Option<Amount>,
    #[serde(rename = "depositAmount", default, skip_serializing_if = "Option::is_none")]
    pub deposit_amount: Option<Amount>,
    #[serde(rename = "refundAmount", default, skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staking_credential: Option<PublicKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_key_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<u64>,
    #[serde(rename = "tokenBundle", default, skip_serializing_if = "Option::is_none")]
    pub token_bundle: Option<Vec<TokenBundleItem>>,
    #[serde(rename = "poolRegistrationCert", default, skip_serializing_if = "Option::is_none")]
    pub pool_registration_cert: Option<String>,
    #[serde(rename = "poolRegistrationParams", default, skip_serializing_if = "Option::is_none")]
    pub pool_registration_params: Option<PoolRegistrationParams>,
    #[serde(rename = "voteRegistrationMetadata", default, skip_serializing_if = "Option::is_none")]
    pub vote_registration_metadata: Option<VoteRegistrationMetadata>,
}

impl OperationMetadata {
    pub fn with_staking_credential(key: PublicKey) -> Self {
        OperationMetadata {
            staking_credential: Some(key),
            ..Default::default()
        }
    }
}
