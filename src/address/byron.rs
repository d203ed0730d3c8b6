//! Legacy (Byron) base58 addresses.

use crate::error::{Error, Result};
use cml_chain::address::Address;
use cml_chain::byron::ByronAddress;
use cml_crypto::RawBytesEncoding;

/// Decode a base58 Byron address. The CRC32 checksum must match its payload.
pub fn decode(address: &str) -> Result<ByronAddress> {
    ByronAddress::from_base58(address)
        .map_err(|e| Error::InvalidAddress(format!("Invalid Byron address {address}: {e}")))
}

/// Hash of the spending data (28 bytes).
pub fn root(addr: &ByronAddress) -> Vec<u8> {
    addr.content.address_id.to_raw_bytes().to_vec()
}

/// Present only on testnet addresses.
pub fn protocol_magic(addr: &ByronAddress) -> Option<u32> {
    addr.content.addr_attributes.protocol_magic.map(u32::from)
}

pub fn is_mainnet(addr: &ByronAddress) -> bool {
    addr.content.addr_attributes.protocol_magic.is_none()
}

/// The full CBOR bytes, as they appear in transaction outputs.
pub fn to_bytes(addr: &ByronAddress) -> Vec<u8> {
    Address::Byron(addr.clone()).to_raw_bytes()
}
