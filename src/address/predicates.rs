//! Total predicates over untrusted strings.
//!
//! None of these panic; malformed or empty input simply yields `false`.

use crate::model::CURVE_EDWARDS25519;

/// Marker used by Rosetta clients for an empty asset name.
pub const EMPTY_TOKEN_NAME: &str = "\\x";

const ED25519_KEY_HASH_HEX_LEN: usize = 56;
const PUBLIC_KEY_HEX_LEN: usize = 64;
const MAX_TOKEN_NAME_HEX_LEN: usize = 64;

fn is_hex_of_len(s: &str, len: usize) -> bool {
    s.len() == len && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Looks at the bech32 prefix only; the checksum is not verified here.
pub fn is_stake_address(address: &str) -> bool {
    let prefix: String = address.chars().take(10).collect::<String>().to_lowercase();
    prefix.contains("stake") || prefix.contains("stake_test")
}

pub fn is_ed25519_key_hash(hash: &str) -> bool {
    is_hex_of_len(hash, ED25519_KEY_HASH_HEX_LEN)
}

pub fn is_policy_id_valid(policy_id: &str) -> bool {
    is_hex_of_len(policy_id, ED25519_KEY_HASH_HEX_LEN)
}

pub fn is_token_name_valid(name: &str) -> bool {
    name == EMPTY_TOKEN_NAME
        || (name.len() <= MAX_TOKEN_NAME_HEX_LEN && name.chars().all(|c| c.is_ascii_hexdigit()))
}

/// A 32-byte Ed25519 public key in hex, on the edwards25519 curve.
pub fn is_key_valid(hex_bytes: &str, curve_type: &str) -> bool {
    is_hex_of_len(hex_bytes, PUBLIC_KEY_HEX_LEN) && curve_type == CURVE_EDWARDS25519
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_stake_address() {
        assert!(is_stake_address(
            "stake1uxa5pudxg77g3sdaddecmw8tvc6hmynywn49lltt4fmvn7caek7a5"
        ));
        assert!(is_stake_address(
            "stake_test1uza5pudxg77g3sdaddecmw8tvc6hmynywn49lltt4fmvn7c6nuuef"
        ));
        assert!(!is_stake_address(
            "addr1vxa5pudxg77g3sdaddecmw8tvc6hmynywn49lltt4fmvn7cpnkcpx"
        ));
        assert!(!is_stake_address(""));
    }

    #[test]
    fn test_key_hash_and_policy() {
        assert!(is_ed25519_key_hash(
            "bb40f1a647bc88c1bd6b738db8eb66357d926474ea5ffd6baa76c9fb"
        ));
        assert!(!is_ed25519_key_hash("bb40f1a647"));
        assert!(!is_policy_id_valid(
            "zz40f1a647bc88c1bd6b738db8eb66357d926474ea5ffd6baa76c9fb"
        ));
    }

    #[test]
    fn test_token_name() {
        assert!(is_token_name_valid(""));
        assert!(is_token_name_valid("\\x"));
        assert!(is_token_name_valid("4172676f6e"));
        assert!(!is_token_name_valid(&"a".repeat(66)));
        assert!(!is_token_name_valid("not hex"));
    }

    #[test]
    fn test_key_valid() {
        let key = "1b400d60aaf34eaf6dcbab9bba46001a23497886cf11066f7846933d30e5ad3f";
        assert!(is_key_valid(key, "edwards25519"));
        assert!(!is_key_valid(key, "secp256k1"));
        assert!(!is_key_valid(&key[2..], "edwards25519"));
    }

    proptest! {
        #[test]
        fn predicates_never_panic(s in ".*") {
            let _ = is_stake_address(&s);
            let _ = is_ed25519_key_hash(&s);
            let _ = is_policy_id_valid(&s);
            let _ = is_token_name_valid(&s);
            let _ = is_key_valid(&s, "edwards25519");
        }
    }
}
