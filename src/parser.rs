//! Decode signed or unsigned transactions back into Rosetta operations.

use crate::address::{encode_address, reward_address_from_credential, EMPTY_TOKEN_NAME};
use crate::error::{Error, Result};
use crate::intent::{
    decode_vote_registration, encode_cert_hex, parse_operations, registration_params,
    OperationType,
};
use crate::model::{
    AccountIdentifier, Amount, CoinChange, Currency, Operation, OperationIdentifier,
    OperationMetadata, TokenBundleItem, STATUS_SUCCESS,
};
use crate::network::Network;
use crate::tx::{envelope, DecodedTransaction, Envelope, ExtraData};
use cml_chain::assets::MultiAsset;
use cml_chain::certs::Certificate;
use cml_chain::transaction::{TransactionBody, TransactionOutput};
use cml_core::serialization::Serialize;

/// Operations and, for signed transactions, the accounts that signed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTransaction {
    pub operations: Vec<Operation>,
    pub signers: Vec<AccountIdentifier>,
}

/// Strip every `[tx_hex, extra_data]` wrapper, however deeply nested.
/// Anything else is returned as is.
pub fn unwrap_if_needed(packed_hex: &str) -> Result<String> {
    let mut current = packed_hex.to_string();
    while let Ok(bytes) = hex::decode(current.trim()) {
        match envelope::wrapped_tx_hex(&bytes)? {
            Some(inner) => current = inner,
            None => break,
        }
    }
    Ok(current)
}

/// Rebuild the operations of a wrapped or raw transaction.
pub fn parse(network: Network, transaction: &str, signed: bool) -> Result<ParsedTransaction> {
    let (tx_bytes, extra) = open(transaction)?;

    let tx = DecodedTransaction::decode(&tx_bytes).map_err(|e| {
        tracing::error!(error = %e, "cannot decode transaction");
        Error::InvalidTransaction
    })?;

    let has_witnesses = tx.witness_set.is_some();
    if signed && !has_witnesses {
        return Err(Error::CantCreateSignedTransaction);
    }
    if !signed && has_witnesses {
        return Err(Error::CantCreateUnsignedTransaction);
    }

    let aux_data = match extra.aux_data()? {
        Some(aux) => Some(aux),
        None => tx.auxiliary_data.as_ref().map(|a| a.to_cbor_bytes()),
    };

    let status = if signed { STATUS_SUCCESS } else { "" };
    let operations = rebuild(&tx.body, &extra, aux_data.as_deref(), network, status)?;

    let signers = if signed {
        parse_operations(&extra.operations, network)?
            .signers
            .into_iter()
            .map(AccountIdentifier::new)
            .collect()
    } else {
        Vec::new()
    };
    tracing::info!(
        operations = operations.len(),
        signers = signers.len(),
        signed,
        "parsed transaction"
    );
    Ok(ParsedTransaction {
        operations,
        signers,
    })
}

fn open(transaction: &str) -> Result<(Vec<u8>, ExtraData)> {
    match Envelope::decode(transaction) {
        Ok(envelope) => {
            let tx_hex = unwrap_if_needed(&envelope.tx_hex)?;
            let bytes = hex::decode(tx_hex.trim()).map_err(|_| Error::InvalidTransaction)?;
            Ok((bytes, envelope.extra))
        }
        Err(_) => {
            let bytes = hex::decode(transaction.trim()).map_err(|_| Error::InvalidTransaction)?;
            Ok((bytes, ExtraData::default()))
        }
    }
}

/// Operations grouped in canonical order.
#[derive(Default)]
struct Groups {
    inputs: Vec<Operation>,
    withdrawals: Vec<Operation>,
    registrations: Vec<Operation>,
    deregistrations: Vec<Operation>,
    delegations: Vec<Operation>,
    pool_registrations: Vec<Operation>,
    pool_retirements: Vec<Operation>,
    votes: Vec<Operation>,
    outputs: Vec<Operation>,
}

fn rebuild(
    body: &TransactionBody,
    extra: &ExtraData,
    aux_data: Option<&[u8]>,
    network: Network,
    status: &str,
) -> Result<Vec<Operation>> {
    let mut groups = Groups::default();

    let extra_inputs: Vec<&Operation> = extra.operations_of(OperationType::Input).collect();
    for input in body.inputs.iter() {
        let identifier = format!("{}:{}", input.transaction_id.to_hex(), input.index);
        let known = extra_inputs.iter().find(|op| {
            op.coin_change
                .as_ref()
                .is_some_and(|c| c.coin_identifier.identifier == identifier)
        });
        groups.inputs.push(match known {
            Some(op) => (*op).clone(),
            None => Operation {
                coin_change: Some(CoinChange::spent(identifier)),
                ..Operation::new(0, OperationType::Input.as_str())
            },
        });
    }

    let extra_withdrawals: Vec<&Operation> =
        extra.operations_of(OperationType::Withdrawal).collect();
    let withdrawals = body.withdrawals.iter().flat_map(|w| w.iter());
    for (i, (account, amount)) in withdrawals.enumerate() {
        let address = account.clone().to_address().to_raw_bytes();
        groups.withdrawals.push(Operation {
            account: Some(AccountIdentifier::new(encode_address(&address)?)),
            amount: Some(Amount::lovelace(amount)),
            metadata: staking_metadata(extra_withdrawals.get(i).copied()),
            ..Operation::new(0, OperationType::Withdrawal.as_str())
        });
    }

    let extra_certs: Vec<&Operation> = extra
        .operations
        .iter()
        .filter(|op| {
            op.kind.parse::<OperationType>().is_ok_and(|k| {
                k.is_pool() || (k.is_staking() && k != OperationType::Withdrawal)
            })
        })
        .collect();
    for (i, cert) in body.certs.iter().flat_map(|c| c.iter()).enumerate() {
        let source = extra_certs.get(i).copied();
        let (group, op) = certificate_operation(cert, source, network)?;
        match group {
            OperationType::StakeKeyRegistration => groups.registrations.push(op),
            OperationType::StakeKeyDeregistration => groups.deregistrations.push(op),
            OperationType::StakeDelegation => groups.delegations.push(op),
            OperationType::PoolRetirement => groups.pool_retirements.push(op),
            _ => groups.pool_registrations.push(op),
        }
    }

    if extra.operations_of(OperationType::VoteRegistration).next().is_some() {
        let aux = aux_data.ok_or(Error::MissingVoteRegistrationMetadata)?;
        let metadata = decode_vote_registration(aux)?;
        groups.votes.push(Operation {
            metadata: Some(OperationMetadata {
                vote_registration_metadata: Some(metadata),
                ..Default::default()
            }),
            ..Operation::new(0, OperationType::VoteRegistration.as_str())
        });
    }

    for output in body.outputs.iter() {
        groups.outputs.push(output_operation(output)?);
    }

    Ok(canonical(groups, status))
}

fn staking_metadata(source: Option<&Operation>) -> Option<OperationMetadata> {
    source
        .and_then(|op| op.metadata.as_ref())
        .and_then(|m| m.staking_credential.clone())
        .map(OperationMetadata::with_staking_credential)
}

fn certificate_operation(
    cert: &Certificate,
    source: Option<&Operation>,
    network: Network,
) -> Result<(OperationType, Operation)> {
    let source_kind = source.and_then(|op| op.kind.parse::<OperationType>().ok());
    let source_account = source.and_then(|op| op.account.clone());

    let (kind, account, metadata) = match cert {
        Certificate::StakeRegistration(reg) => (
            OperationType::StakeKeyRegistration,
            Some(reward_address_from_credential(network, &reg.stake_credential)?),
            staking_metadata(source),
        ),
        Certificate::RegCert(reg) => (
            OperationType::StakeKeyRegistration,
            Some(reward_address_from_credential(network, &reg.stake_credential)?),
            staking_metadata(source),
        ),
        Certificate::StakeDeregistration(dereg) => (
            OperationType::StakeKeyDeregistration,
            Some(reward_address_from_credential(network, &dereg.stake_credential)?),
            staking_metadata(source),
        ),
        Certificate::UnregCert(dereg) => (
            OperationType::StakeKeyDeregistration,
            Some(reward_address_from_credential(network, &dereg.stake_credential)?),
            staking_metadata(source),
        ),
        Certificate::StakeDelegation(delegation) => {
            let mut metadata = staking_metadata(source).unwrap_or_default();
            metadata.pool_key_hash = Some(delegation.pool.to_hex());
            (
                OperationType::StakeDelegation,
                Some(reward_address_from_credential(
                    network,
                    &delegation.stake_credential,
                )?),
                Some(metadata),
            )
        }
        Certificate::PoolRegistration(registration) => {
            let params = &registration.pool_params;
            let with_cert = source_kind == Some(OperationType::PoolRegistrationWithCert);
            let metadata = if with_cert {
                OperationMetadata {
                    pool_registration_cert: Some(encode_cert_hex(cert)),
                    ..Default::default()
                }
            } else {
                OperationMetadata {
                    pool_registration_params: Some(registration_params(params, network)?),
                    ..Default::default()
                }
            };
            let kind = if with_cert {
                OperationType::PoolRegistrationWithCert
            } else {
                OperationType::PoolRegistration
            };
            let account = source_account
                .map(|a| a.address)
                .unwrap_or_else(|| params.operator.to_hex());
            (kind, Some(account), Some(metadata))
        }
        Certificate::PoolRetirement(retirement) => {
            let account = source_account
                .map(|a| a.address)
                .unwrap_or_else(|| retirement.pool.to_hex());
            (
                OperationType::PoolRetirement,
                Some(account),
                Some(OperationMetadata {
                    epoch: Some(retirement.epoch),
                    ..Default::default()
                }),
            )
        }
        other => {
            tracing::error!(certificate = ?other, "unsupported certificate");
            return Err(Error::InvalidTransaction);
        }
    };

    let op = Operation {
        account: account.map(AccountIdentifier::new),
        metadata,
        ..Operation::new(0, kind.as_str())
    };
    Ok((kind, op))
}

fn output_operation(output: &TransactionOutput) -> Result<Operation> {
    let value = output.amount();
    let metadata = (!value.multiasset.is_empty()).then(|| OperationMetadata {
        token_bundle: Some(token_bundle(&value.multiasset)),
        ..Default::default()
    });
    Ok(Operation {
        account: Some(AccountIdentifier::new(encode_address(
            &output.address().to_raw_bytes(),
        )?)),
        amount: Some(Amount::lovelace(value.coin)),
        metadata,
        ..Operation::new(0, OperationType::Output.as_str())
    })
}

fn token_bundle(assets: &MultiAsset) -> Vec<TokenBundleItem> {
    assets
        .iter()
        .map(|(policy, tokens)| TokenBundleItem {
            policy_id: policy.to_hex(),
            tokens: tokens
                .iter()
                .map(|(name, quantity)| {
                    let symbol = if name.inner.is_empty() {
                        EMPTY_TOKEN_NAME.to_string()
                    } else {
                        hex::encode(&name.inner)
                    };
                    Amount {
                        value: quantity.to_string(),
                        currency: Currency::token(symbol),
                    }
                })
                .collect(),
        })
        .collect()
}

/// Flatten the groups, number operations from zero and link outputs to inputs.
fn canonical(groups: Groups, status: &str) -> Vec<Operation> {
    let Groups {
        inputs,
        withdrawals,
        registrations,
        deregistrations,
        delegations,
        pool_registrations,
        pool_retirements,
        votes,
        outputs,
    } = groups;

    let input_ids: Vec<OperationIdentifier> = (0..inputs.len() as u64)
        .map(OperationIdentifier::new)
        .collect();
    let outputs = outputs.into_iter().map(|mut op| {
        op.related_operations = Some(input_ids.clone());
        op
    });

    inputs
        .into_iter()
        .chain(withdrawals)
        .chain(registrations)
        .chain(deregistrations)
        .chain(delegations)
        .chain(pool_registrations)
        .chain(pool_retirements)
        .chain(votes)
        .chain(outputs)
        .enumerate()
        .map(|(index, mut op)| {
            op.operation_identifier = OperationIdentifier::new(index as u64);
            op.status = Some(status.to_string());
            op
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::config::ProtocolParams;
    use crate::model::{CoinAction, PublicKey};
    use proptest::prelude::*;

    const SIGNED: &str = include_str!("../tests/fixtures/signed_transaction.hex");
    const UNSIGNED: &str = include_str!("../tests/fixtures/unsigned_transaction.hex");
    const ADDRESS: &str = "addr1vxa5pudxg77g3sdaddecmw8tvc6hmynywn49lltt4fmvn7cpnkcpx";
    const STAKE_KEY: &str = "1b400d60aaf34eaf6dcbab9bba46001a23497886cf11066f7846933d30e5ad3f";
    const POOL_KEY_HASH: &str = "1b268f4cba3faa7e36d8a0cc4adca2096fb856119412ee7330f692b5";
    const TX_HASH: &str = "2f23fd8cca835af21f3ac375bac601f97ead75f2e79143bdf71fe2c4be043e8f";

    #[test]
    fn test_parse_signed_fixture() {
        let parsed = parse(Network::Mainnet, SIGNED.trim(), true).unwrap();
        assert_eq!(parsed.operations.len(), 3);

        let input = &parsed.operations[0];
        assert_eq!(input.kind, "input");
        assert_eq!(input.amount_value(), Some("-90000"));
        assert_eq!(
            input.coin_change.as_ref().map(|c| c.coin_action),
            Some(CoinAction::Spent)
        );
        assert_eq!(input.status.as_deref(), Some("success"));

        let tokens = &parsed.operations[1];
        assert_eq!(tokens.kind, "output");
        assert_eq!(tokens.amount_value(), Some("10000"));
        let bundle = tokens
            .metadata
            .as_ref()
            .and_then(|m| m.token_bundle.as_ref())
            .unwrap();
        assert_eq!(bundle[0].tokens.len(), 3);
        assert_eq!(bundle[0].tokens[0].currency.symbol, "477569646f436f696e");
        assert_eq!(bundle[0].tokens[0].value, "2310");
        assert_eq!(
            tokens.related_operations,
            Some(vec![OperationIdentifier::new(0)])
        );

        assert_eq!(parsed.operations[2].amount_value(), Some("40000"));
        assert_eq!(parsed.signers, vec![AccountIdentifier::new(ADDRESS)]);
    }

    #[test]
    fn test_parse_unsigned_fixture() {
        let parsed = parse(Network::Mainnet, UNSIGNED.trim(), false).unwrap();
        let kinds: Vec<_> = parsed.operations.iter().map(|o| o.kind.as_str()).collect();
        assert_eq!(kinds, vec!["input", "stakeKeyDeregistration", "output", "output"]);

        let dereg = &parsed.operations[1];
        assert!(dereg.amount.is_none());
        assert!(dereg.coin_change.is_none());
        let key = dereg
            .metadata
            .as_ref()
            .and_then(|m| m.staking_credential.as_ref())
            .map(|k| k.hex_bytes.to_lowercase());
        assert_eq!(key.as_deref(), Some(STAKE_KEY));
        assert_eq!(
            dereg.account.as_ref().map(|a| a.address.as_str()),
            Some("stake1uxa5pudxg77g3sdaddecmw8tvc6hmynywn49lltt4fmvn7caek7a5")
        );
        assert!(parsed.operations.iter().all(|o| o.status.as_deref() == Some("")));
        assert_eq!(parsed.operations[3].operation_identifier.index, 3);
        assert!(parsed.signers.is_empty());
    }

    #[test]
    fn test_signed_flag_mismatch() {
        let err = parse(Network::Mainnet, UNSIGNED.trim(), true).unwrap_err();
        assert_eq!(err.code(), 4011);
        let err = parse(Network::Mainnet, SIGNED.trim(), false).unwrap_err();
        assert_eq!(err.code(), 4012);
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse(Network::Mainnet, "zz", false).unwrap_err().code(), 5019);
        assert_eq!(parse(Network::Mainnet, "ff", false).unwrap_err().code(), 5019);
        assert_eq!(parse(Network::Mainnet, "80", false).unwrap_err().code(), 5019);
    }

    #[test]
    fn test_unwrap_if_needed() {
        let raw = unwrap_if_needed(SIGNED.trim()).unwrap();
        assert!(raw.starts_with("84a4"));
        assert_eq!(unwrap_if_needed(&raw).unwrap(), raw);
        assert_eq!(unwrap_if_needed("a0").unwrap(), "a0");
        assert_eq!(unwrap_if_needed("80").unwrap_err().code(), 5019);
    }

    #[test]
    fn test_unwrap_nested_wrappers() {
        let once = Envelope::new(&[0xa0], ExtraData::default()).encode().unwrap();
        assert_eq!(once, "82626130a16a6f7065726174696f6e7380");
        let twice = Envelope::new(&hex::decode(&once).unwrap(), ExtraData::default())
            .encode()
            .unwrap();
        assert_eq!(unwrap_if_needed(&once).unwrap(), "a0");
        assert_eq!(unwrap_if_needed(&twice).unwrap(), "a0");
        // [[tx_hex, extra_data]]
        assert_eq!(unwrap_if_needed(&format!("81{once}")).unwrap(), "a0");
    }

    #[test]
    fn test_parse_doubly_wrapped() {
        let once = Envelope::decode(UNSIGNED.trim()).unwrap();
        let inner = hex::decode(once.encode().unwrap()).unwrap();
        let twice = Envelope::new(&inner, once.extra.clone()).encode().unwrap();
        assert_eq!(
            parse(Network::Mainnet, &twice, false).unwrap(),
            parse(Network::Mainnet, UNSIGNED.trim(), false).unwrap()
        );
    }

    fn op(index: u64, kind: &str) -> Operation {
        Operation::new(index, kind)
    }

    fn staking(index: u64, kind: &str) -> Operation {
        Operation {
            metadata: Some(OperationMetadata::with_staking_credential(
                PublicKey::edwards25519(STAKE_KEY),
            )),
            ..op(index, kind)
        }
    }

    #[test]
    fn test_round_trip_reorders_operations() {
        let operations = vec![
            Operation {
                related_operations: Some(vec![OperationIdentifier::new(1)]),
                account: Some(AccountIdentifier::new(ADDRESS)),
                amount: Some(Amount::lovelace(1_000_000)),
                ..op(0, "output")
            },
            Operation {
                account: Some(AccountIdentifier::new(ADDRESS)),
                amount: Some(Amount::lovelace(-510_000_000)),
                coin_change: Some(CoinChange::spent(format!("{TX_HASH}:0"))),
                ..op(1, "input")
            },
            Operation {
                metadata: Some(OperationMetadata {
                    pool_key_hash: Some(POOL_KEY_HASH.to_string()),
                    ..OperationMetadata::with_staking_credential(PublicKey::edwards25519(
                        STAKE_KEY,
                    ))
                }),
                ..op(2, "stakeDelegation")
            },
            staking(3, "stakeKeyRegistration"),
            Operation {
                amount: Some(Amount::lovelace(10)),
                ..staking(4, "withdrawal")
            },
        ];
        let unsigned = build(
            Network::Mainnet,
            &operations,
            1000,
            &ProtocolParams::default(),
            None,
        )
        .unwrap();
        let extra = ExtraData::from_operations(&operations, None);
        let packed = Envelope::new(&unsigned.cbor_bytes, extra).encode().unwrap();

        let parsed = parse(Network::Mainnet, &packed, false).unwrap();
        let kinds: Vec<_> = parsed.operations.iter().map(|o| o.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec!["input", "withdrawal", "stakeKeyRegistration", "stakeDelegation", "output"]
        );
        let indices: Vec<_> = parsed
            .operations
            .iter()
            .map(|o| o.operation_identifier.index)
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(parsed.operations[1].amount_value(), Some("10"));
        assert_eq!(
            parsed.operations[3]
                .metadata
                .as_ref()
                .and_then(|m| m.pool_key_hash.as_deref()),
            Some(POOL_KEY_HASH)
        );
        assert_eq!(
            parsed.operations[4].related_operations,
            Some(vec![OperationIdentifier::new(0)])
        );
    }

    #[test]
    fn test_raw_body_without_extra_data() {
        let operations = vec![
            Operation {
                account: Some(AccountIdentifier::new(ADDRESS)),
                amount: Some(Amount::lovelace(-2_000)),
                coin_change: Some(CoinChange::spent(format!("{TX_HASH}:3"))),
                ..op(0, "input")
            },
            Operation {
                account: Some(AccountIdentifier::new(ADDRESS)),
                amount: Some(Amount::lovelace(1_000)),
                ..op(1, "output")
            },
        ];
        let unsigned = build(
            Network::Mainnet,
            &operations,
            1000,
            &ProtocolParams::default(),
            None,
        )
        .unwrap();
        let parsed = parse(Network::Mainnet, &hex::encode(&unsigned.cbor_bytes), false).unwrap();
        let input = &parsed.operations[0];
        assert!(input.amount.is_none());
        assert_eq!(
            input.coin_change.as_ref().map(|c| c.coin_identifier.identifier.clone()),
            Some(format!("{TX_HASH}:3"))
        );
    }

    proptest! {
        #[test]
        fn unwrap_is_idempotent(
            payload in prop::collection::vec(any::<u8>(), 0..64),
            depth in 0usize..4,
            nest in any::<bool>(),
        ) {
            let mut packed = hex::encode(&payload);
            for _ in 0..depth {
                let bytes = hex::decode(&packed).unwrap();
                packed = Envelope::new(&bytes, ExtraData::default()).encode().unwrap();
            }
            if nest && depth > 0 {
                packed = format!("81{packed}");
            }
            if let Ok(once) = unwrap_if_needed(&packed) {
                prop_assert_eq!(unwrap_if_needed(&once).ok(), Some(once.clone()));
            }
        }
    }
}
