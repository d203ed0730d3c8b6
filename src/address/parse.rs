//! Address parsing into typed components.

use super::byron;
use super::derive::to_bech32;
use crate::error::{Error, Result};
use cml_chain::address::Address;
use cml_chain::certs::Credential;
use cml_crypto::RawBytesEncoding;
use serde_json::Value as JsonValue;

/// Address era.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    Byron,
    Shelley,
}

impl Era {
    pub fn as_str(&self) -> &'static str {
        match self {
            Era::Byron => "byron",
            Era::Shelley => "shelley",
        }
    }
}

/// Kind of a parsed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Base,
    Enterprise,
    Reward,
    Pointer,
    Legacy,
}

impl AddressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressKind::Base => "base",
            AddressKind::Enterprise => "enterprise",
            AddressKind::Reward => "reward",
            AddressKind::Pointer => "pointer",
            AddressKind::Legacy => "byron",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AddressKind::Base => "Base (Shelley)",
            AddressKind::Enterprise => "Enterprise (Shelley, no staking)",
            AddressKind::Reward => "Reward/Stake",
            AddressKind::Pointer => "Pointer (Shelley)",
            AddressKind::Legacy => "Byron (Legacy)",
        }
    }
}

/// Network family recoverable from an address alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressNetwork {
    Mainnet,
    Testnet,
}

impl AddressNetwork {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressNetwork::Mainnet => "mainnet",
            AddressNetwork::Testnet => "testnet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialType {
    KeyHash,
    ScriptHash,
}

impl CredentialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialType::KeyHash => "keyhash",
            CredentialType::ScriptHash => "scripthash",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialHash {
    pub cred_type: CredentialType,
    pub hash: Vec<u8>,
}

impl CredentialHash {
    pub fn hex(&self) -> String {
        hex::encode(&self.hash)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pointer {
    pub slot: u64,
    pub tx_index: u64,
    pub cert_index: u64,
}

/// Typed view of an address string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressComponents {
    pub address: String,
    pub era: Era,
    pub address_type: AddressKind,
    pub network: AddressNetwork,
    pub payment_credential: Option<CredentialHash>,
    pub stake_credential: Option<CredentialHash>,
    pub pointer: Option<Pointer>,
    /// Binary form as written into transaction outputs.
    pub bytes: Vec<u8>,
}

/// Parse a bech32 Shelley address or a base58 Byron address.
pub fn parse_address(text: &str) -> Result<AddressComponents> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::InvalidAddress("Empty address".to_string()));
    }
    if text.starts_with("addr") || text.starts_with("stake") {
        parse_shelley(text)
    } else {
        parse_byron(text)
    }
}

/// Binary form of an address string.
pub fn address_bytes(text: &str) -> Result<Vec<u8>> {
    Ok(parse_address(text)?.bytes)
}

/// Text form of binary address bytes found in a transaction.
pub fn encode_address(bytes: &[u8]) -> Result<String> {
    if bytes.is_empty() {
        return Err(Error::InvalidAddress("Empty address bytes".to_string()));
    }
    let addr = Address::from_raw_bytes(bytes)
        .map_err(|e| Error::InvalidAddress(format!("Invalid address bytes: {e}")))?;
    match addr {
        Address::Byron(byron) => Ok(byron.to_base58()),
        other => to_bech32(other),
    }
}

fn parse_shelley(text: &str) -> Result<AddressComponents> {
    let addr = Address::from_bech32(text)
        .map_err(|e| Error::InvalidAddress(format!("Invalid address {text}: {e}")))?;

    // Network id is the low nibble of the header; only mainnet (1) is distinguishable.
    let bytes = addr.to_raw_bytes();
    let network = match bytes.first().map(|h| h & 0x0f) {
        Some(1) => AddressNetwork::Mainnet,
        _ => AddressNetwork::Testnet,
    };

    let address = text.to_string();
    let components = match addr {
        Address::Base(base_addr) => AddressComponents {
            address,
            era: Era::Shelley,
            address_type: AddressKind::Base,
            network,
            payment_credential: Some(credential_hash(&base_addr.payment)),
            stake_credential: Some(credential_hash(&base_addr.stake)),
            pointer: None,
            bytes,
        },
        Address::Enterprise(enterprise_addr) => AddressComponents {
            address,
            era: Era::Shelley,
            address_type: AddressKind::Enterprise,
            network,
            payment_credential: Some(credential_hash(&enterprise_addr.payment)),
            stake_credential: None,
            pointer: None,
            bytes,
        },
        Address::Ptr(ptr_addr) => AddressComponents {
            address,
            era: Era::Shelley,
            address_type: AddressKind::Pointer,
            network,
            payment_credential: Some(credential_hash(&ptr_addr.payment)),
            stake_credential: None,
            pointer: Some(Pointer {
                slot: ptr_addr.stake.slot(),
                tx_index: ptr_addr.stake.tx_index(),
                cert_index: ptr_addr.stake.cert_index(),
            }),
            bytes,
        },
        Address::Reward(reward_addr) => AddressComponents {
            address,
            era: Era::Shelley,
            address_type: AddressKind::Reward,
            network,
            payment_credential: None,
            stake_credential: Some(credential_hash(&reward_addr.payment)),
            pointer: None,
            bytes,
        },
        Address::Byron(_) => {
            return Err(Error::InvalidAddress(format!(
                "Byron address in bech32 form: {text}"
            )));
        }
    };
    Ok(components)
}

fn parse_byron(text: &str) -> Result<AddressComponents> {
    let addr = byron::decode(text)?;
    Ok(AddressComponents {
        address: text.to_string(),
        era: Era::Byron,
        address_type: AddressKind::Legacy,
        network: if byron::is_mainnet(&addr) {
            AddressNetwork::Mainnet
        } else {
            AddressNetwork::Testnet
        },
        payment_credential: Some(CredentialHash {
            cred_type: CredentialType::KeyHash,
            hash: byron::root(&addr),
        }),
        stake_credential: None,
        pointer: None,
        bytes: byron::to_bytes(&addr),
    })
}

fn credential_hash(cred: &Credential) -> CredentialHash {
    match cred {
        Credential::PubKey { hash, .. } => CredentialHash {
            cred_type: CredentialType::KeyHash,
            hash: hash.to_raw_bytes().to_vec(),
        },
        Credential::Script { hash, .. } => CredentialHash {
            cred_type: CredentialType::ScriptHash,
            hash: hash.to_raw_bytes().to_vec(),
        },
    }
}

impl AddressComponents {
    /// Convert to JSON.
    pub fn to_json(&self) -> JsonValue {
        let mut json = serde_json::json!({
            "address": self.address,
            "era": self.era.as_str(),
            "type": self.address_type.as_str(),
            "network": self.network.as_str(),
            "hex": hex::encode(&self.bytes)
        });

        if let Some(ref payment) = self.payment_credential {
            json["payment_credential"] = serde_json::json!({
                "type": payment.cred_type.as_str(),
                "hash": payment.hex()
            });
        }

        if let Some(ref stake) = self.stake_credential {
            json["stake_credential"] = serde_json::json!({
                "type": stake.cred_type.as_str(),
                "hash": stake.hex()
            });
        }

        if let Some(ref ptr) = self.pointer {
            json["pointer"] = serde_json::json!({
                "slot": ptr.slot,
                "tx_index": ptr.tx_index,
                "cert_index": ptr.cert_index
            });
        }

        json
    }

    /// Format as pretty string for terminal output.
    pub fn to_pretty(&self) -> String {
        use colored::Colorize;

        let mut output = format!("{}\n", "Address Details".bold().cyan());
        output.push_str(&format!("  {}: {}\n", "Address".bold(), self.address));
        output.push_str(&format!(
            "  {}: {}\n",
            "Type".bold(),
            self.address_type.description().green()
        ));

        let network = match self.network {
            AddressNetwork::Mainnet => self.network.as_str().yellow(),
            AddressNetwork::Testnet => self.network.as_str().blue(),
        };
        output.push_str(&format!("  {}: {}\n", "Network".bold(), network));

        if let Some(ref payment) = self.payment_credential {
            output.push_str(&format!(
                "  {}: {} {}\n",
                "Payment".bold(),
                payment.cred_type.as_str().cyan(),
                payment.hex().dimmed()
            ));
        }

        if let Some(ref stake) = self.stake_credential {
            output.push_str(&format!(
                "  {}: {} {}\n",
                "Stake".bold(),
                stake.cred_type.as_str().cyan(),
                stake.hex().dimmed()
            ));
        }

        if let Some(ref ptr) = self.pointer {
            output.push_str(&format!(
                "  {}: slot={}, tx={}, cert={}\n",
                "Pointer".bold(),
                ptr.slot,
                ptr.tx_index,
                ptr.cert_index
            ));
        }

        output
    }
}
