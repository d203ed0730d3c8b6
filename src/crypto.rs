//! Blake2b digests used by addresses, key hashes and transaction ids.

/// Blake2b-224 of an Ed25519 public key, i.e. its key hash.
pub fn key_hash(public_key: &[u8]) -> [u8; 28] {
    cml_crypto::blake2b224(public_key)
}

/// Blake2b-256, used for transaction body hashes and auxiliary data hashes.
pub fn hash256(bytes: &[u8]) -> [u8; 32] {
    cml_crypto::blake2b256(bytes)
}
