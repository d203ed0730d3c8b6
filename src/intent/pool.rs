//! Stake pool registration and retirement operations.

use crate::address::{
    is_ed25519_key_hash, parse_address, reward_address_from_credential,
    reward_address_from_key_hash, AddressKind,
};
use crate::error::{Error, Result};
use crate::model::{
    Operation, PoolMargin, PoolMetadata, PoolRegistrationParams, Relay as RelayParams,
};
use crate::network::Network;
use cml_chain::address::Address;
use cml_chain::certs::{
    Certificate, DNSName, Ipv4, Ipv6, PoolMetadata as PoolMetadataRef, PoolParams, Relay, Url,
};
use cml_chain::UnitInterval;
use cml_core::serialization::{Deserialize, Serialize};
use cml_crypto::{Ed25519KeyHash, PoolMetadataHash, RawBytesEncoding, VRFKeyHash};
use std::net::{Ipv4Addr, Ipv6Addr};

const SINGLE_HOST_ADDR: &str = "single_host_addr";
const SINGLE_HOST_NAME: &str = "single_host_name";
const MULTI_HOST_NAME: &str = "multi_host_name";

/// Pool key hash given as hex, e.g. the account address of a pool operation.
pub(crate) fn parse_pool_key_hash(hash: Option<&str>) -> Result<Ed25519KeyHash> {
    let hash = hash.filter(|h| !h.is_empty()).ok_or(Error::MissingPoolKeyHash)?;
    if !is_ed25519_key_hash(hash) {
        return Err(Error::InvalidPoolKeyHash(format!("Invalid pool key hash {hash}")));
    }
    Ed25519KeyHash::from_hex(hash).map_err(|e| Error::InvalidPoolKeyHash(e.to_string()))
}

/// Certificate and signers of a `poolRegistration` operation.
pub(super) fn pool_registration(op: &Operation) -> Result<(Certificate, Vec<String>)> {
    let params = op
        .metadata
        .as_ref()
        .and_then(|m| m.pool_registration_params.as_ref())
        .ok_or(Error::MissingPoolRegistrationParams)?;

    let (pledge, cost, margin) = parse_amounts(params)?;
    let operator = parse_pool_key_hash(op.account_address())?;

    let vrf_keyhash = VRFKeyHash::from_hex(&params.vrf_key_hash).map_err(|_| {
        Error::InvalidPoolRegistrationParams(format!(
            "Invalid vrf key hash {}",
            params.vrf_key_hash
        ))
    })?;

    let reward = parse_address(&params.reward_address)?;
    let reward_account = match Address::from_raw_bytes(&reward.bytes) {
        Ok(Address::Reward(account)) if reward.address_type == AddressKind::Reward => account,
        _ => {
            return Err(Error::InvalidAddress(format!(
                "Pool reward address must be a stake address: {}",
                params.reward_address
            )));
        }
    };

    let owners = parse_owners(&params.pool_owners)?;
    let relays = params
        .relays
        .iter()
        .map(parse_relay)
        .collect::<Result<Vec<_>>>()?;
    if relays.is_empty() {
        return Err(Error::InvalidPoolRelays("Empty relays received".to_string()));
    }
    let metadata = params
        .pool_metadata
        .as_ref()
        .map(parse_metadata)
        .transpose()?;

    let mut signers = params.pool_owners.clone();
    signers.push(params.reward_address.clone());
    if let Some(address) = op.account_address() {
        signers.push(address.to_string());
    }

    let cert = Certificate::new_pool_registration(PoolParams::new(
        operator,
        vrf_keyhash,
        pledge,
        cost,
        margin,
        reward_account,
        owners.into(),
        relays,
        metadata,
    ));
    Ok((cert, signers))
}

/// Certificate and signers of a `poolRegistrationWithCert` operation.
pub(super) fn pool_registration_with_cert(
    op: &Operation,
    network: Network,
) -> Result<(Certificate, Vec<String>)> {
    let pool_key_hash = op.account_address().ok_or(Error::MissingPoolKeyHash)?;
    parse_pool_key_hash(Some(pool_key_hash))?;

    let cert_hex = op
        .metadata
        .as_ref()
        .and_then(|m| m.pool_registration_cert.as_deref())
        .filter(|c| !c.is_empty())
        .ok_or(Error::MissingPoolCert)?;
    let cert = decode_pool_cert(cert_hex)?;
    let Certificate::PoolRegistration(ref registration) = cert else {
        return Err(Error::InvalidPoolCertType);
    };

    let mut signers = pool_signers(&registration.pool_params, network)?;
    signers.push(pool_key_hash.to_string());
    Ok((cert, signers))
}

/// Reward and owner addresses of registered pool params.
pub(crate) fn pool_signers(params: &PoolParams, network: Network) -> Result<Vec<String>> {
    let mut signers = params
        .pool_owners
        .iter()
        .map(|owner| reward_address_from_key_hash(network, owner))
        .collect::<Result<Vec<_>>>()?;
    // Re-encoded for the requested network.
    signers.push(reward_address_from_credential(
        network,
        &params.reward_account.payment,
    )?);
    Ok(signers)
}

pub(crate) fn decode_pool_cert(cert_hex: &str) -> Result<Certificate> {
    let bytes = hex::decode(cert_hex).map_err(|e| Error::InvalidPoolCert(e.to_string()))?;
    Certificate::from_cbor_bytes(&bytes).map_err(|e| Error::InvalidPoolCert(e.to_string()))
}

/// Certificate and signer of a `poolRetirement` operation.
pub(super) fn pool_retirement(op: &Operation) -> Result<(Certificate, String)> {
    let epoch = op
        .metadata
        .as_ref()
        .and_then(|m| m.epoch)
        .ok_or(Error::MissingEpoch)?;
    let address = op.account_address().ok_or(Error::MissingEpoch)?;
    let pool_key_hash = parse_pool_key_hash(Some(address))?;
    Ok((
        Certificate::new_pool_retirement(pool_key_hash, epoch),
        address.to_string(),
    ))
}

/// Operation metadata describing registered pool params, the inverse of
/// `pool_registration`.
pub(crate) fn registration_params(
    params: &PoolParams,
    network: Network,
) -> Result<PoolRegistrationParams> {
    let pool_owners = params
        .pool_owners
        .iter()
        .map(|owner| reward_address_from_key_hash(network, owner))
        .collect::<Result<Vec<_>>>()?;
    let relays = params
        .relays
        .iter()
        .map(|relay| match relay {
            Relay::SingleHostAddr(addr) => RelayParams {
                kind: SINGLE_HOST_ADDR.to_string(),
                ipv4: addr
                    .ipv4
                    .as_ref()
                    .and_then(|ip| <[u8; 4]>::try_from(ip.inner.as_slice()).ok())
                    .map(|ip| Ipv4Addr::from(ip).to_string()),
                ipv6: addr
                    .ipv6
                    .as_ref()
                    .and_then(|ip| <[u8; 16]>::try_from(ip.inner.as_slice()).ok())
                    .map(|ip| Ipv6Addr::from(ip).to_string()),
                dns_name: None,
                port: addr.port.map(|p| p.to_string()),
            },
            Relay::SingleHostName(host) => RelayParams {
                kind: SINGLE_HOST_NAME.to_string(),
                dns_name: Some(host.dns_name.inner.clone()),
                port: host.port.map(|p| p.to_string()),
                ..Default::default()
            },
            Relay::MultiHostName(host) => RelayParams {
                kind: MULTI_HOST_NAME.to_string(),
                dns_name: Some(host.dns_name.inner.clone()),
                ..Default::default()
            },
        })
        .collect();

    Ok(PoolRegistrationParams {
        vrf_key_hash: params.vrf_keyhash.to_hex(),
        reward_address: reward_address_from_credential(network, &params.reward_account.payment)?,
        pledge: params.pledge.to_string(),
        cost: params.cost.to_string(),
        pool_owners,
        relays,
        margin: Some(PoolMargin {
            numerator: params.margin.start.to_string(),
            denominator: params.margin.end.to_string(),
        }),
        margin_percentage: None,
        pool_metadata: params.pool_metadata.as_ref().map(|m| PoolMetadata {
            url: m.url.inner.clone(),
            hash: m.pool_metadata_hash.to_hex(),
        }),
    })
}

/// Hex CBOR of a certificate.
pub(crate) fn encode_cert_hex(cert: &Certificate) -> String {
    hex::encode(cert.to_cbor_bytes())
}

fn parse_amounts(params: &PoolRegistrationParams) -> Result<(u64, u64, UnitInterval)> {
    let number = |key: &str, value: &str| {
        value.parse::<u64>().map_err(|_| {
            Error::InvalidPoolRegistrationParams(format!("Given {key} {value} is invalid"))
        })
    };
    let margin = match (&params.margin, &params.margin_percentage) {
        (Some(m), _) if !m.numerator.is_empty() && !m.denominator.is_empty() => UnitInterval::new(
            number("numerator", &m.numerator)?,
            number("denominator", &m.denominator)?,
        ),
        (_, Some(p)) => margin_from_percentage(p).ok_or_else(|| {
            Error::InvalidPoolRegistrationParams(format!("Given margin_percentage {p} is invalid"))
        })?,
        _ => {
            return Err(Error::InvalidPoolRegistrationParams(
                "Missing margin parameter at pool registration parameters".to_string(),
            ));
        }
    };
    if margin.end == 0 || margin.start > margin.end {
        return Err(Error::InvalidPoolRegistrationParams(format!(
            "Given margin {}/{} is invalid",
            margin.start, margin.end
        )));
    }
    Ok((
        number("pledge", &params.pledge)?,
        number("cost", &params.cost)?,
        margin,
    ))
}

/// A decimal fraction such as `"0.025"` as an exact ratio.
fn margin_from_percentage(percentage: &str) -> Option<UnitInterval> {
    let (int, frac) = percentage.split_once('.').unwrap_or((percentage, ""));
    let digits = format!("{int}{frac}");
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let denominator = 10u64.checked_pow(u32::try_from(frac.len()).ok()?)?;
    let numerator = digits.parse::<u64>().ok()?;
    (numerator <= denominator).then(|| UnitInterval::new(numerator, denominator))
}

fn parse_owners(owners: &[String]) -> Result<Vec<Ed25519KeyHash>> {
    let mut hashes: Vec<Ed25519KeyHash> = Vec::with_capacity(owners.len());
    for owner in owners {
        let parsed =
            parse_address(owner).map_err(|e| Error::InvalidPoolOwners(e.description().unwrap_or_default()))?;
        let hash = parsed
            .stake_credential
            .and_then(|c| Ed25519KeyHash::from_raw_bytes(&c.hash).ok())
            .ok_or_else(|| Error::InvalidPoolOwners(format!("Owner {owner} has no stake credential")))?;
        if !hashes.contains(&hash) {
            hashes.push(hash);
        }
    }
    if hashes.len() != owners.len() {
        return Err(Error::InvalidPoolOwners(
            "Invalid pool owners addresses provided".to_string(),
        ));
    }
    Ok(hashes)
}

fn parse_port(port: Option<&str>) -> Result<Option<u16>> {
    port.filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<u16>()
                .map_err(|_| Error::InvalidPoolRelays(format!("Invalid port {p} received")))
        })
        .transpose()
}

fn dns_name(relay: &RelayParams) -> Result<DNSName> {
    let name = relay
        .dns_name
        .clone()
        .filter(|d| !d.is_empty())
        .ok_or(Error::MissingDnsName)?;
    DNSName::new(name).map_err(|e| Error::InvalidPoolRelays(format!("Invalid dns name: {e}")))
}

fn parse_relay(relay: &RelayParams) -> Result<Relay> {
    let port = parse_port(relay.port.as_deref())?;
    let invalid = |ip: &str| Error::InvalidPoolRelays(format!("Invalid ip {ip}"));
    match relay.kind.as_str() {
        SINGLE_HOST_ADDR => {
            let ipv4 = relay
                .ipv4
                .as_deref()
                .filter(|ip| !ip.is_empty())
                .map(|ip| {
                    ip.parse::<Ipv4Addr>()
                        .ok()
                        .and_then(|addr| Ipv4::new(addr.octets().to_vec()).ok())
                        .ok_or_else(|| invalid(ip))
                })
                .transpose()?;
            let ipv6 = relay
                .ipv6
                .as_deref()
                .filter(|ip| !ip.is_empty())
                .map(|ip| {
                    parse_ipv6(ip).and_then(|octets| {
                        Ipv6::new(octets.to_vec()).map_err(|_| invalid(ip))
                    })
                })
                .transpose()?;
            Ok(Relay::new_single_host_addr(port, ipv4, ipv6))
        }
        SINGLE_HOST_NAME => Ok(Relay::new_single_host_name(port, dns_name(relay)?)),
        MULTI_HOST_NAME => Ok(Relay::new_multi_host_name(dns_name(relay)?)),
        _ => Err(Error::InvalidPoolRelayType),
    }
}

/// Standard notation, or 32 hex digits with optional colons.
fn parse_ipv6(ip: &str) -> Result<[u8; 16]> {
    if let Ok(addr) = ip.parse::<Ipv6Addr>() {
        return Ok(addr.octets());
    }
    hex::decode(ip.replace(':', ""))
        .ok()
        .and_then(|b| <[u8; 16]>::try_from(b).ok())
        .ok_or_else(|| Error::InvalidPoolRelays(format!("Invalid ipv6 {ip}")))
}

fn parse_metadata(metadata: &PoolMetadata) -> Result<PoolMetadataRef> {
    if metadata.url.is_empty() {
        return Err(Error::InvalidPoolMetadata("Empty metadata url".to_string()));
    }
    let url = Url::new(metadata.url.clone())
        .map_err(|e| Error::InvalidPoolMetadata(format!("Invalid metadata url: {e}")))?;
    let hash = PoolMetadataHash::from_hex(&metadata.hash)
        .map_err(|_| Error::InvalidPoolMetadata(format!("Invalid metadata hash {}", metadata.hash)))?;
    Ok(PoolMetadataRef::new(url, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountIdentifier, OperationMetadata};

    const POOL_KEY_HASH: &str = "1b268f4cba3faa7e36d8a0cc4adca2096fb856119412ee7330f692b5";
    const REWARD: &str = "stake1uxa5pudxg77g3sdaddecmw8tvc6hmynywn49lltt4fmvn7caek7a5";
    const OWNER: &str = "stake1u9af5n26dtr6nkrs9qv05049x0jkcncau9k6vyd8xrhr7qq8tez5p";
    const POOL_CERT: &str = "8a03581c1b268f4cba3faa7e36d8a0cc4adca2096fb856119412ee7330f692b558208dd154228946bd12967c12bedb1cb6038b78f8b84a1760b1a788fa72a4af3db01a004c4b401a002dc6c0d81e820101581de1bb40f1a647bc88c1bd6b738db8eb66357d926474ea5ffd6baa76c9fb81581c7a9a4d5a6ac7a9d8702818fa3ea533e56c4f1de16da611a730ee3f008184001820445820f5d9505820f5d9ea167fd2e0b19647f18dd1e0826f706f6f6c4d6574616461746155726c58209ac2217288d1ae0b4e15c41b58d3e05a13206fd9ab81cb15943e4174bf30c90b";

    fn params() -> PoolRegistrationParams {
        PoolRegistrationParams {
            vrf_key_hash: "8dd154228946bd12967c12bedb1cb6038b78f8b84a1760b1a788fa72a4af3db0"
                .to_string(),
            reward_address: REWARD.to_string(),
            pledge: "5000000".to_string(),
            cost: "3000000".to_string(),
            pool_owners: vec![OWNER.to_string()],
            relays: vec![RelayParams {
                kind: SINGLE_HOST_ADDR.to_string(),
                ipv4: Some("127.0.0.1".to_string()),
                port: Some("32".to_string()),
                ..Default::default()
            }],
            margin: Some(PoolMargin {
                numerator: "1".to_string(),
                denominator: "1".to_string(),
            }),
            margin_percentage: None,
            pool_metadata: None,
        }
    }

    fn registration(params: PoolRegistrationParams) -> Operation {
        Operation {
            account: Some(AccountIdentifier::new(POOL_KEY_HASH)),
            metadata: Some(OperationMetadata {
                pool_registration_params: Some(params),
                ..Default::default()
            }),
            ..Operation::new(0, "poolRegistration")
        }
    }

    #[test]
    fn test_pool_registration() {
        let (cert, signers) = pool_registration(&registration(params())).unwrap();
        let Certificate::PoolRegistration(reg) = cert else {
            panic!("expected pool registration");
        };
        let p = reg.pool_params;
        assert_eq!(p.operator.to_hex(), POOL_KEY_HASH);
        assert_eq!(p.pledge, 5_000_000);
        assert_eq!(p.reward_account.network, 1);
        assert_eq!(p.relays.len(), 1);
        assert!(matches!(
            &p.relays[0],
            Relay::SingleHostAddr(addr)
                if addr.port == Some(32)
                    && addr.ipv4.as_ref().map(|ip| ip.inner.clone()) == Some(vec![127, 0, 0, 1])
                    && addr.ipv6.is_none()
        ));
        assert_eq!(signers, vec![OWNER, REWARD, POOL_KEY_HASH]);
    }

    #[test]
    fn test_pool_registration_errors() {
        let code = |p: PoolRegistrationParams| pool_registration(&registration(p)).unwrap_err().code();

        let mut op = registration(params());
        op.metadata = None;
        assert_eq!(pool_registration(&op).unwrap_err().code(), 4029);

        let mut p = params();
        p.relays.clear();
        assert_eq!(code(p), 4030);

        let mut p = params();
        p.relays[0].port = Some("port".to_string());
        assert_eq!(code(p), 4030);

        let mut p = params();
        p.pool_metadata = Some(PoolMetadata {
            url: "http://pool".to_string(),
            hash: "00".to_string(),
        });
        assert_eq!(code(p), 4031);

        let mut p = params();
        p.relays[0].kind = SINGLE_HOST_NAME.to_string();
        assert_eq!(code(p), 4032);

        let mut p = params();
        p.relays[0].kind = "carrier_pigeon".to_string();
        assert_eq!(code(p), 4033);

        let mut p = params();
        p.pool_owners = vec!["stake1notvalid".to_string()];
        assert_eq!(code(p), 4034);

        let mut p = params();
        p.cost = "-1".to_string();
        assert_eq!(code(p), 4035);

        let mut p = params();
        p.margin = None;
        assert_eq!(code(p), 4035);
    }

    #[test]
    fn test_margin_percentage() {
        let mut p = params();
        p.margin = None;
        p.margin_percentage = Some("0.25".to_string());
        let (cert, _) = pool_registration(&registration(p)).unwrap();
        let Certificate::PoolRegistration(reg) = cert else {
            panic!("expected pool registration");
        };
        assert_eq!(reg.pool_params.margin.start, 25);
        assert_eq!(reg.pool_params.margin.end, 100);
        assert!(margin_from_percentage("1.5").is_none());
        assert!(margin_from_percentage("abc").is_none());
    }

    #[test]
    fn test_pool_registration_with_cert() {
        let op = Operation {
            account: Some(AccountIdentifier::new(POOL_KEY_HASH)),
            metadata: Some(OperationMetadata {
                pool_registration_cert: Some(POOL_CERT.to_string()),
                ..Default::default()
            }),
            ..Operation::new(0, "poolRegistrationWithCert")
        };
        let (cert, signers) = pool_registration_with_cert(&op, Network::Mainnet).unwrap();
        assert!(matches!(cert, Certificate::PoolRegistration(_)));
        assert_eq!(signers, vec![OWNER, REWARD, POOL_KEY_HASH]);
    }

    #[test]
    fn test_pool_registration_with_cert_errors() {
        let with_cert = |cert: Option<&str>| Operation {
            account: Some(AccountIdentifier::new(POOL_KEY_HASH)),
            metadata: Some(OperationMetadata {
                pool_registration_cert: cert.map(str::to_string),
                ..Default::default()
            }),
            ..Operation::new(0, "poolRegistrationWithCert")
        };
        let code = |op: Operation| {
            pool_registration_with_cert(&op, Network::Mainnet)
                    .unwrap_err()
                .code()
        };
        assert_eq!(code(with_cert(None)), 4026);
        assert_eq!(code(with_cert(Some("zz"))), 4027);
        // A retirement certificate is well formed but of the wrong type.
        assert_eq!(
            code(with_cert(Some(
                "8304581c1b268f4cba3faa7e36d8a0cc4adca2096fb856119412ee7330f692b51864"
            ))),
            4028
        );
    }

    #[test]
    fn test_pool_retirement() {
        let op = Operation {
            account: Some(AccountIdentifier::new(POOL_KEY_HASH)),
            metadata: Some(OperationMetadata {
                epoch: Some(100),
                ..Default::default()
            }),
            ..Operation::new(0, "poolRetirement")
        };
        let (cert, signer) = pool_retirement(&op).unwrap();
        assert!(matches!(cert, Certificate::PoolRetirement(ref r) if r.epoch == 100));
        assert_eq!(signer, POOL_KEY_HASH);

        let op = Operation {
            account: Some(AccountIdentifier::new(POOL_KEY_HASH)),
            ..Operation::new(0, "poolRetirement")
        };
        assert_eq!(pool_retirement(&op).unwrap_err().code(), 4036);
    }

    #[test]
    fn test_registration_params_from_cert() {
        let cert = decode_pool_cert(POOL_CERT).unwrap();
        assert_eq!(encode_cert_hex(&cert), POOL_CERT);
        let Certificate::PoolRegistration(reg) = cert else {
            panic!("expected pool registration");
        };
        let decoded = reg.pool_params;
        let params = registration_params(&decoded, Network::Mainnet).unwrap();
        assert_eq!(params.reward_address, REWARD);
        assert_eq!(params.pool_owners, vec![OWNER]);
        assert_eq!(params.pledge, "5000000");
        assert_eq!(params.cost, "3000000");
        assert_eq!(params.relays[0].kind, SINGLE_HOST_ADDR);
        assert_eq!(params.relays[0].ipv4.as_deref(), Some("88.32.245.217"));
        assert_eq!(params.relays[0].port.as_deref(), Some("32"));
        assert_eq!(params.pool_metadata.as_ref().map(|m| m.url.as_str()), Some("poolMetadataUrl"));

        // The rebuilt params register the same pool.
        let (cert, _) = pool_registration(&registration(params)).unwrap();
        let Certificate::PoolRegistration(rebuilt) = cert else {
            panic!("expected pool registration");
        };
        let rebuilt = rebuilt.pool_params;
        assert_eq!(rebuilt.operator, decoded.operator);
        assert_eq!(rebuilt.vrf_keyhash, decoded.vrf_keyhash);
        assert_eq!(rebuilt.reward_account, decoded.reward_account);
        assert_eq!(rebuilt.pool_owners.to_vec(), decoded.pool_owners.to_vec());
        assert_eq!(
            (rebuilt.margin.start, rebuilt.margin.end),
            (decoded.margin.start, decoded.margin.end)
        );
        assert_eq!(
            rebuilt.relays[0].to_cbor_bytes(),
            decoded.relays[0].to_cbor_bytes()
        );
        assert_eq!(
            rebuilt.pool_metadata.map(|m| m.to_cbor_bytes()),
            decoded.pool_metadata.map(|m| m.to_cbor_bytes())
        );
    }

    #[test]
    fn test_parse_ipv6() {
        assert_eq!(parse_ipv6("::1").unwrap()[15], 1);
        assert_eq!(
            parse_ipv6("2001:0db8:85a3:0000:0000:8a2e:0370:7334").unwrap()[0],
            0x20
        );
        assert!(parse_ipv6("nope").is_err());
    }
}
