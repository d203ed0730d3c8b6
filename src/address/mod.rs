//! Address derivation, parsing and validation.

pub mod byron;
mod derive;
mod parse;
pub mod predicates;

pub use derive::{
    decode_key, derive_address, reward_account, reward_address_from_credential,
    reward_address_from_key, reward_address_from_key_hash,
};
pub use parse::{
    address_bytes, encode_address, parse_address, AddressComponents, AddressKind, AddressNetwork,
    CredentialHash, CredentialType, Era, Pointer,
};
pub use predicates::{
    is_ed25519_key_hash, is_key_valid, is_policy_id_valid, is_stake_address, is_token_name_valid,
    EMPTY_TOKEN_NAME,
};

use crate::error::Error;
use std::str::FromStr;

/// Address types that can be derived from a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressType {
    Base,
    Enterprise,
    Reward,
}

impl FromStr for AddressType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "base" => Ok(AddressType::Base),
            "enterprise" => Ok(AddressType::Enterprise),
            "reward" => Ok(AddressType::Reward),
            _ => Err(Error::InvalidAddressType),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_type_from_str() {
        assert_eq!("Base".parse::<AddressType>().unwrap(), AddressType::Base);
        assert_eq!(
            "Enterprise".parse::<AddressType>().unwrap(),
            AddressType::Enterprise
        );
        assert!(matches!(
            "Pointer".parse::<AddressType>(),
            Err(Error::InvalidAddressType)
        ));
    }
}
