//! Request and response documents of the construction flows.

use super::metadata::PublicKey;
use super::operation::{AccountIdentifier, Amount, Operation};
use crate::config::{DepositParameters, ProtocolParams};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeriveMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staking_credential: Option<PublicKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeriveRequest {
    #[serde(default)]
    pub public_key: Option<PublicKey>,
    #[serde(default)]
    pub metadata: Option<DeriveMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeriveResponse {
    pub account_identifier: AccountIdentifier,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_ttl: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit_parameters: Option<DepositParameters>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessRequest {
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub metadata: Option<PreprocessMetadata>,
}

/// Options handed from preprocess to metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessOptions {
    pub relative_ttl: u64,
    pub transaction_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessResponse {
    pub options: PreprocessOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataRequest {
    pub options: PreprocessOptions,
    /// Current chain tip slot; supplied by the caller.
    #[serde(default)]
    pub tip_slot: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionMetadata {
    /// Absolute TTL slot as a decimal string.
    pub ttl: String,
    pub protocol_parameters: ProtocolParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataResponse {
    pub metadata: ConstructionMetadata,
    pub suggested_fee: Vec<Amount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayloadsMetadata {
    pub ttl: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_parameters: Option<ProtocolParams>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadsRequest {
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub metadata: Option<PayloadsMetadata>,
}

pub const SIGNATURE_TYPE_ED25519: &str = "ed25519";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_identifier: Option<AccountIdentifier>,
    pub hex_bytes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadsResponse {
    pub unsigned_transaction: String,
    pub payloads: Vec<SigningPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseRequest {
    pub signed: bool,
    pub transaction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResponse {
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub account_identifier_signers: Vec<AccountIdentifier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    pub signing_payload: SigningPayload,
    pub public_key: PublicKey,
    pub signature_type: String,
    pub hex_bytes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineRequest {
    pub unsigned_transaction: String,
    pub signatures: Vec<Signature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineResponse {
    pub signed_transaction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTransactionRequest {
    pub signed_transaction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIdentifier {
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionIdentifierResponse {
    pub transaction_identifier: TransactionIdentifier,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_request_shape() {
        let json = r#"{
            "unsigned_transaction": "00",
            "signatures": [{
                "signing_payload": {
                    "account_identifier": {"address": "addr1vxa5pudxg77g3sdaddecmw8tvc6hmynywn49lltt4fmvn7cpnkcpx"},
                    "hex_bytes": "aa",
                    "signature_type": "ed25519"
                },
                "public_key": {"hex_bytes": "bb", "curve_type": "edwards25519"},
                "signature_type": "ed25519",
                "hex_bytes": "cc"
            }]
        }"#;
        let req: CombineRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.signatures.len(), 1);
        assert_eq!(req.signatures[0].public_key.hex_bytes, "bb");
    }

    #[test]
    fn test_preprocess_metadata_optional() {
        let req: PreprocessRequest = serde_json::from_str(r#"{"operations": []}"#).unwrap();
        assert!(req.metadata.is_none());
    }
}
