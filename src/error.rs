//! Error types for rosetta-construct.
//!
//! Every construction failure carries the stable Rosetta error code and message that API
//! clients match on. Free-form detail goes to [`Error::description`], never into the message.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for construction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing, parsing or submitting transactions.
#[derive(Error, Debug)]
pub enum Error {
    /// No input was provided (no file, no stdin, no inline document).
    #[error("No input provided. Use: rosetta-construct <command> <file|json|hex>, or pipe to stdin")]
    NoInput,

    /// The specified file was not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// An I/O error occurred.
    #[error("IO error{}: {source}", path.as_ref().map(|p| format!(" reading {}", p.display())).unwrap_or_default())]
    IoError {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// A request document or configuration file is not valid JSON for its type.
    #[error("Invalid request document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    #[error("Invalid Network configuration")]
    InvalidNetwork(String),

    #[error("Invalid public key format")]
    InvalidPublicKeyFormat,

    #[error("Public key is missing")]
    PublicKeyMissing,

    #[error("Transaction inputs parameters errors in operations array")]
    TransactionInputsParametersMissing(String),

    #[error("Transaction outputs parameters errors in operations array")]
    TransactionOutputsParametersMissing(String),

    #[error("The transaction you are trying to build has more outputs than inputs")]
    OutputsExceedInputs,

    #[error("Cant create signed transaction from transaction bytes")]
    CantCreateSignedTransaction,

    #[error("Cant create unsigned transaction from transaction bytes")]
    CantCreateUnsignedTransaction,

    #[error("Cant deserialize transaction input from transaction body")]
    TransactionInputDeserialization(String),

    #[error("Cant deserialize transaction output from transaction body")]
    TransactionOutputDeserialization(String),

    #[error("Provided address is invalid")]
    InvalidAddress(String),

    #[error("Provided address type is invalid")]
    InvalidAddressType,

    #[error("Invalid staking key format")]
    InvalidStakingKeyFormat,

    #[error("Staking key is required for this type of address")]
    MissingStakingKey,

    #[error("Provided operation type is invalid")]
    UnsupportedOperationType(String),

    #[error("Pool key hash is required to operate")]
    MissingPoolKeyHash,

    #[error("Assets are required for output operation token bundle")]
    TokenBundleAssetsMissing,

    #[error("Asset value is required for token asset")]
    TokenAssetValueMissing,

    #[error("Invalid policy id")]
    InvalidPolicyId(String),

    #[error("Invalid token name")]
    InvalidTokenName(String),

    #[error("Provided pool key hash has invalid format")]
    InvalidPoolKeyHash(String),

    #[error("Pool registration certificate is required for pool registration")]
    MissingPoolCert,

    #[error("Invalid pool registration certificate format")]
    InvalidPoolCert(String),

    #[error("Invalid certificate type. Expected pool registration certificate")]
    InvalidPoolCertType,

    #[error("Pool registration parameters were expected")]
    MissingPoolRegistrationParams,

    #[error("Pool relays are invalid")]
    InvalidPoolRelays(String),

    #[error("Pool metadata is invalid")]
    InvalidPoolMetadata(String),

    #[error("Dns name expected for pool relay")]
    MissingDnsName,

    #[error("Invalid pool relay type received")]
    InvalidPoolRelayType,

    #[error("Invalid pool owners received")]
    InvalidPoolOwners(String),

    #[error("Invalid pool registration parameters received")]
    InvalidPoolRegistrationParams(String),

    #[error("Mandatory parameter is missing: Epoch")]
    MissingEpoch,

    #[error("An error occurred")]
    Unspecified(String),

    #[error("Parse signed transaction error")]
    ParseSignedTransaction,

    #[error("Cant create signed transaction probably because of unsigned transaction bytes")]
    CantCreateSignTransaction,

    #[error("Cant build witnesses set for transaction probably because of provided signatures")]
    CantBuildWitnessesSet(String),

    /// Node submission failed. Retriable; the description carries the node's raw answer.
    #[error("Error when sending the transaction")]
    SendTransaction(String),

    #[error("Voting nonce not valid")]
    VotingNonceNotValid,

    #[error("Invalid voting signature")]
    InvalidVotingSignature,

    #[error("Voting key is missing")]
    MissingVotingKey,

    #[error("Voting key format is invalid")]
    InvalidVotingKeyFormat,

    #[error("Missing vote registration metadata")]
    MissingVoteRegistrationMetadata,

    #[error("Missing chain code")]
    ChainCodeMissing,

    #[error("Can't decode Transaction")]
    InvalidTransaction,

    #[error("Withdrawal amounts cannot be negative")]
    NegativeWithdrawalAmount,

    /// Output formatting error.
    #[error("Format error: {0}")]
    FormatError(String),
}

/// Rosetta `Error` object as returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosettaError {
    pub code: u16,
    pub message: String,
    pub retriable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Error {
    /// Stable Rosetta error code.
    pub fn code(&self) -> u16 {
        match self {
            Error::InvalidNetwork(_) => 4000,
            Error::InvalidPublicKeyFormat => 4007,
            Error::PublicKeyMissing | Error::TransactionInputsParametersMissing(_) => 4008,
            Error::TransactionOutputsParametersMissing(_) => 4009,
            Error::OutputsExceedInputs => 4010,
            Error::CantCreateSignedTransaction => 4011,
            Error::CantCreateUnsignedTransaction => 4012,
            Error::TransactionInputDeserialization(_) => 4013,
            Error::TransactionOutputDeserialization(_) => 4014,
            Error::InvalidAddress(_) => 4015,
            Error::InvalidAddressType => 4016,
            Error::InvalidStakingKeyFormat => 4017,
            Error::MissingStakingKey => 4018,
            Error::UnsupportedOperationType(_) => 4019,
            Error::MissingPoolKeyHash => 4020,
            Error::TokenBundleAssetsMissing => 4021,
            Error::TokenAssetValueMissing => 4022,
            Error::InvalidPolicyId(_) => 4023,
            Error::InvalidTokenName(_) => 4024,
            Error::InvalidPoolKeyHash(_) => 4025,
            Error::MissingPoolCert => 4026,
            Error::InvalidPoolCert(_) => 4027,
            Error::InvalidPoolCertType => 4028,
            Error::MissingPoolRegistrationParams => 4029,
            Error::InvalidPoolRelays(_) => 4030,
            Error::InvalidPoolMetadata(_) => 4031,
            Error::MissingDnsName => 4032,
            Error::InvalidPoolRelayType => 4033,
            Error::InvalidPoolOwners(_) => 4034,
            Error::InvalidPoolRegistrationParams(_) => 4035,
            Error::MissingEpoch => 4036,
            Error::Unspecified(_)
            | Error::NoInput
            | Error::FileNotFound(_)
            | Error::IoError { .. }
            | Error::InvalidDocument(_)
            | Error::FormatError(_) => 5000,
            Error::ParseSignedTransaction => 5003,
            Error::CantCreateSignTransaction => 5004,
            Error::CantBuildWitnessesSet(_) => 5005,
            Error::SendTransaction(_) => 5006,
            Error::VotingNonceNotValid => 5007,
            Error::InvalidVotingSignature => 5008,
            Error::MissingVotingKey => 5009,
            Error::InvalidVotingKeyFormat => 5010,
            Error::MissingVoteRegistrationMetadata => 5011,
            Error::ChainCodeMissing => 5012,
            Error::InvalidTransaction => 5019,
            Error::NegativeWithdrawalAmount => 5044,
        }
    }

    /// Whether the caller may retry the same request.
    pub fn retriable(&self) -> bool {
        matches!(
            self,
            Error::InvalidAddress(_) | Error::UnsupportedOperationType(_) | Error::SendTransaction(_)
        )
    }

    /// Free-form detail attached to the error, if any.
    pub fn description(&self) -> Option<String> {
        match self {
            Error::InvalidNetwork(s)
            | Error::TransactionInputsParametersMissing(s)
            | Error::TransactionOutputsParametersMissing(s)
            | Error::TransactionInputDeserialization(s)
            | Error::TransactionOutputDeserialization(s)
            | Error::InvalidAddress(s)
            | Error::UnsupportedOperationType(s)
            | Error::InvalidPolicyId(s)
            | Error::InvalidTokenName(s)
            | Error::InvalidPoolKeyHash(s)
            | Error::InvalidPoolCert(s)
            | Error::InvalidPoolRelays(s)
            | Error::InvalidPoolMetadata(s)
            | Error::InvalidPoolOwners(s)
            | Error::InvalidPoolRegistrationParams(s)
            | Error::Unspecified(s)
            | Error::CantBuildWitnessesSet(s)
            | Error::SendTransaction(s) => Some(s.clone()),
            Error::NoInput
            | Error::FileNotFound(_)
            | Error::IoError { .. }
            | Error::InvalidDocument(_)
            | Error::FormatError(_) => Some(self.to_string()),
            _ => None,
        }
    }

    /// Convert into the Rosetta error object.
    pub fn to_rosetta(&self) -> RosettaError {
        RosettaError {
            code: self.code(),
            message: self.to_string(),
            retriable: self.retriable(),
            description: self.description().filter(|d| !d.is_empty()),
        }
    }

    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Transaction bytes could not be decoded or assembled
            Error::InvalidTransaction
            | Error::CantCreateSignedTransaction
            | Error::CantCreateUnsignedTransaction
            | Error::CantCreateSignTransaction
            | Error::ParseSignedTransaction => 1,
            // I/O errors
            Error::NoInput | Error::FileNotFound(_) | Error::IoError { .. } => 3,
            // Format errors
            Error::FormatError(_) => 5,
            // Node submission errors
            Error::SendTransaction(_) => 6,
            // Request validation errors
            _ => 2,
        }
    }
}
