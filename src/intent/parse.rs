//! Per-operation validation and the fold that builds a [`TransactionIntent`].

use super::{pool, vote, OperationType, TransactionIntent};
use crate::address::{
    address_bytes, decode_key, is_policy_id_valid, is_stake_address, is_token_name_valid,
    parse_address, reward_account, reward_address_from_key_hash, EMPTY_TOKEN_NAME,
};
use crate::crypto::key_hash;
use crate::error::{Error, Result};
use crate::model::{Operation, TokenBundleItem};
use crate::network::Network;
use cml_chain::address::{Address, RewardAccount};
use cml_chain::assets::{AssetName, MultiAsset, Value};
use cml_chain::certs::{Certificate, Credential};
use cml_chain::transaction::{TransactionInput, TransactionOutput};
use cml_chain::PolicyId;
use cml_crypto::{Ed25519KeyHash, RawBytesEncoding, TransactionHash};
use std::collections::BTreeMap;

/// Fold `operations` into a transaction intent.
///
/// Fails on the first invalid operation; nothing is kept between calls.
pub fn parse_operations(operations: &[Operation], network: Network) -> Result<TransactionIntent> {
    let intent = operations
        .iter()
        .try_fold(TransactionIntent::default(), |intent, op| {
            apply(intent, op, network)
        })?;
    tracing::debug!(
        inputs = intent.inputs.len(),
        outputs = intent.outputs.len(),
        certificates = intent.certs.len(),
        withdrawals = intent.withdrawals.len(),
        signers = intent.signers.len(),
        "operations parsed"
    );
    Ok(intent)
}

fn apply(mut intent: TransactionIntent, op: &Operation, network: Network) -> Result<TransactionIntent> {
    let kind: OperationType = op.kind.parse()?;
    tracing::trace!(index = op.operation_identifier.index, %kind, "operation");

    match kind {
        OperationType::Input => {
            let (input, amount) = parse_input(op)?;
            intent.inputs.push(input);
            intent.input_amounts.push(amount);
            if let Some(address) = op.account_address() {
                parse_address(address)?;
                intent.signers.insert(address.to_string());
            }
        }
        OperationType::Output => {
            let output = parse_output(op)?;
            intent.output_amounts.push(i128::from(output.amount().coin));
            intent.outputs.push(output);
        }
        OperationType::StakeKeyRegistration => {
            let hash = stake_key_hash(op)?;
            intent
                .certs
                .push(Certificate::new_stake_registration(Credential::new_pub_key(hash)));
            intent.stake_key_registrations += 1;
        }
        OperationType::StakeKeyDeregistration => {
            let hash = stake_key_hash(op)?;
            intent.signers.insert(reward_address_from_key_hash(network, &hash)?);
            intent
                .certs
                .push(Certificate::new_stake_deregistration(Credential::new_pub_key(hash)));
            intent.stake_key_deregistrations += 1;
        }
        OperationType::StakeDelegation => {
            let hash = stake_key_hash(op)?;
            let pool = op
                .metadata
                .as_ref()
                .and_then(|m| m.pool_key_hash.as_deref())
                .ok_or(Error::MissingPoolKeyHash)?;
            let pool_key_hash = pool::parse_pool_key_hash(Some(pool))?;
            intent.signers.insert(reward_address_from_key_hash(network, &hash)?);
            intent.certs.push(Certificate::new_stake_delegation(
                Credential::new_pub_key(hash),
                pool_key_hash,
            ));
        }
        OperationType::Withdrawal => {
            let (account, amount, signer) = parse_withdrawal(op, network)?;
            if intent.withdrawals.insert(account, amount).is_some() {
                return Err(Error::Unspecified(format!(
                    "Withdrawal from {signer} has already been added"
                )));
            }
            intent.withdrawal_amounts.push(i128::from(amount));
            intent.signers.insert(signer);
        }
        OperationType::PoolRegistration => {
            let (cert, signers) = pool::pool_registration(op)?;
            intent.certs.push(cert);
            intent.signers.extend(signers);
            intent.pool_registrations += 1;
        }
        OperationType::PoolRegistrationWithCert => {
            let (cert, signers) = pool::pool_registration_with_cert(op, network)?;
            intent.certs.push(cert);
            intent.signers.extend(signers);
            intent.pool_registrations += 1;
        }
        OperationType::PoolRetirement => {
            let (cert, signer) = pool::pool_retirement(op)?;
            intent.certs.push(cert);
            intent.signers.insert(signer);
        }
        OperationType::VoteRegistration => {
            let metadata = op
                .metadata
                .as_ref()
                .and_then(|m| m.vote_registration_metadata.as_ref())
                .ok_or(Error::MissingVoteRegistrationMetadata)?;
            intent.auxiliary_data = Some(vote::encode_vote_registration(metadata)?);
        }
    }
    Ok(intent)
}

fn parse_input(op: &Operation) -> Result<(TransactionInput, i128)> {
    let missing = |msg: &str| Error::TransactionInputsParametersMissing(msg.to_string());

    let coin = op
        .coin_change
        .as_ref()
        .ok_or_else(|| missing("Input has missing coin_change field"))?;
    let (hash, index) = coin
        .coin_identifier
        .identifier
        .split_once(':')
        .filter(|(h, i)| !h.is_empty() && !i.is_empty())
        .ok_or_else(|| missing("Input has invalid coin_identifier field"))?;

    let value = op
        .amount_value()
        .ok_or_else(|| missing("Input has missing amount value field"))?;
    let amount = value
        .parse::<i128>()
        .map_err(|_| missing("Input has invalid amount value"))?;
    if amount > 0 {
        return Err(missing("Input has positive amount value"));
    }
    if amount.unsigned_abs() > u128::from(u64::MAX) {
        return Err(missing("Input amount is out of range"));
    }

    let tx_hash = TransactionHash::from_hex(hash)
        .map_err(|_| Error::TransactionInputDeserialization(format!("Invalid transaction id {hash}")))?;
    let index = index
        .parse::<u64>()
        .map_err(|_| Error::TransactionInputDeserialization(format!("Invalid output index {index}")))?;

    Ok((TransactionInput::new(tx_hash, index), amount))
}

fn parse_output(op: &Operation) -> Result<TransactionOutput> {
    let address = op.account_address().ok_or_else(|| {
        Error::TransactionOutputDeserialization("Output has missing address field".to_string())
    })?;
    let invalid = |e: Error| {
        Error::TransactionOutputDeserialization(format!(
            "Invalid input: {address} {}",
            e.description().unwrap_or_default()
        ))
    };
    let address = address_bytes(address)
        .and_then(|bytes| {
            Address::from_raw_bytes(&bytes).map_err(|e| Error::InvalidAddress(e.to_string()))
        })
        .map_err(invalid)?;

    let value = op.amount_value().ok_or_else(|| {
        Error::TransactionOutputDeserialization("Output has missing amount field".to_string())
    })?;
    let coin = value.parse::<u64>().map_err(|_| {
        Error::TransactionOutputsParametersMissing(format!(
            "Output has negative or invalid amount value {value}"
        ))
    })?;

    let assets = match op.metadata.as_ref().and_then(|m| m.token_bundle.as_deref()) {
        Some(bundle) => parse_token_bundle(bundle)?,
        None => MultiAsset::new(),
    };

    Ok(TransactionOutput::new(address, Value::new(coin, assets), None, None))
}

/// Assets are collected sorted by policy and name so the encoding is canonical.
fn parse_token_bundle(bundle: &[TokenBundleItem]) -> Result<MultiAsset> {
    let sorted = bundle.iter().try_fold(BTreeMap::new(), |mut assets, item| {
        let policy_id = &item.policy_id;
        if !is_policy_id_valid(policy_id) {
            return Err(Error::InvalidPolicyId(format!("PolicyId {policy_id} is not valid")));
        }
        if item.tokens.is_empty() {
            return Err(Error::TokenBundleAssetsMissing);
        }
        let policy = PolicyId::from_hex(policy_id)
            .map_err(|_| Error::InvalidPolicyId(format!("PolicyId {policy_id} is not valid")))?;
        let tokens: &mut BTreeMap<Vec<u8>, u64> = assets.entry(policy).or_default();

        for token in &item.tokens {
            let symbol = &token.currency.symbol;
            let invalid_name =
                || Error::InvalidTokenName(format!("Token name {symbol} is not valid"));
            if !is_token_name_valid(symbol) {
                return Err(invalid_name());
            }
            let name = if symbol == EMPTY_TOKEN_NAME {
                Vec::new()
            } else {
                hex::decode(symbol).map_err(|_| invalid_name())?
            };
            if token.value.is_empty() {
                return Err(Error::TokenAssetValueMissing);
            }
            let quantity = token.value.parse::<u64>().map_err(|_| {
                Error::TransactionOutputsParametersMissing(format!(
                    "Asset {symbol} has negative or invalid value {}",
                    token.value
                ))
            })?;
            if tokens.insert(name, quantity).is_some() {
                return Err(Error::TransactionOutputsParametersMissing(format!(
                    "Token name {symbol} has already been added for policy {policy_id}"
                )));
            }
        }
        Ok(assets)
    })?;

    let mut assets = MultiAsset::new();
    for (policy, tokens) in sorted {
        for (name, quantity) in tokens {
            let name = AssetName::new(name)
                .map_err(|e| Error::InvalidTokenName(format!("Token name is not valid: {e}")))?;
            assets.set(policy, name, quantity);
        }
    }
    Ok(assets)
}

/// Key hash of the operation's `staking_credential`.
fn stake_key_hash(op: &Operation) -> Result<Ed25519KeyHash> {
    let key = op
        .metadata
        .as_ref()
        .and_then(|m| m.staking_credential.as_ref())
        .ok_or(Error::MissingStakingKey)?;
    let key = decode_key(key).ok_or(Error::InvalidStakingKeyFormat)?;
    Ok(Ed25519KeyHash::from(key_hash(&key)))
}

fn parse_withdrawal(op: &Operation, network: Network) -> Result<(RewardAccount, u64, String)> {
    let has_key = op
        .metadata
        .as_ref()
        .is_some_and(|m| m.staking_credential.is_some());
    let (reward_account, signer) = if has_key {
        let hash = stake_key_hash(op)?;
        (
            reward_account(network, &hash),
            reward_address_from_key_hash(network, &hash)?,
        )
    } else {
        match op.account_address() {
            Some(address) if is_stake_address(address) => {
                let account = match Address::from_bech32(address) {
                    Ok(Address::Reward(account)) => account,
                    _ => {
                        return Err(Error::InvalidAddress(format!(
                            "Invalid reward address {address}"
                        )))
                    }
                };
                (account, address.to_string())
            }
            _ => return Err(Error::MissingStakingKey),
        }
    };

    let value = op
        .amount_value()
        .ok_or_else(|| Error::Unspecified("Withdrawal has missing amount value".to_string()))?;
    let amount = value
        .parse::<i128>()
        .map_err(|_| Error::Unspecified(format!("Invalid withdrawal amount {value}")))?;
    if amount < 0 {
        return Err(Error::NegativeWithdrawalAmount);
    }
    let amount = u64::try_from(amount)
        .map_err(|_| Error::Unspecified(format!("Invalid withdrawal amount {value}")))?;

    Ok((reward_account, amount, signer))
}
