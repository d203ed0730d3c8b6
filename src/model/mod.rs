//! Rosetta JSON model used by the construction flows.

pub mod api;
pub mod metadata;
pub mod operation;

pub use metadata::{
    OperationMetadata, PoolMargin, PoolMetadata, PoolRegistrationParams, PublicKey, Relay,
    TokenBundleItem, VoteRegistrationMetadata, CURVE_EDWARDS25519,
};
pub use operation::{
    AccountIdentifier, AccountIdentifierMetadata, Amount, CoinAction, CoinChange, CoinIdentifier,
    Currency, CurrencyMetadata, Operation, OperationIdentifier, ADA, ADA_DECIMALS, STATUS_SUCCESS,
};
