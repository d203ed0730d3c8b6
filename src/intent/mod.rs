//! Rosetta operations folded into a typed transaction intent.

mod parse;
mod pool;
mod vote;

pub use parse::parse_operations;
pub(crate) use pool::{encode_cert_hex, registration_params};
pub use vote::{decode_vote_registration, encode_vote_registration};

use crate::config::Deposits;
use crate::error::Error;
use crate::fee::DepositTotals;
use cml_chain::certs::Certificate;
use cml_chain::transaction::{TransactionInput, TransactionOutput};
use cml_chain::Withdrawals;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Operation types understood by the construction engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Input,
    Output,
    StakeKeyRegistration,
    StakeKeyDeregistration,
    StakeDelegation,
    Withdrawal,
    PoolRegistration,
    PoolRegistrationWithCert,
    PoolRetirement,
    VoteRegistration,
}

impl OperationType {
    pub const ALL: [OperationType; 10] = [
        OperationType::Input,
        OperationType::Output,
        OperationType::StakeKeyRegistration,
        OperationType::StakeKeyDeregistration,
        OperationType::StakeDelegation,
        OperationType::Withdrawal,
        OperationType::PoolRegistration,
        OperationType::PoolRegistrationWithCert,
        OperationType::PoolRetirement,
        OperationType::VoteRegistration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Input => "input",
            OperationType::Output => "output",
            OperationType::StakeKeyRegistration => "stakeKeyRegistration",
            OperationType::StakeKeyDeregistration => "stakeKeyDeregistration",
            OperationType::StakeDelegation => "stakeDelegation",
            OperationType::Withdrawal => "withdrawal",
            OperationType::PoolRegistration => "poolRegistration",
            OperationType::PoolRegistrationWithCert => "poolRegistrationWithCert",
            OperationType::PoolRetirement => "poolRetirement",
            OperationType::VoteRegistration => "voteRegistration",
        }
    }

    /// Operations that act on a stake credential.
    pub fn is_staking(&self) -> bool {
        matches!(
            self,
            OperationType::StakeKeyRegistration
                | OperationType::StakeKeyDeregistration
                | OperationType::StakeDelegation
                | OperationType::Withdrawal
        )
    }

    /// Operations signed by a pool cold key.
    pub fn is_pool(&self) -> bool {
        matches!(
            self,
            OperationType::PoolRegistration
                | OperationType::PoolRegistrationWithCert
                | OperationType::PoolRetirement
        )
    }

    pub fn is_vote(&self) -> bool {
        matches!(self, OperationType::VoteRegistration)
    }
}

impl FromStr for OperationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        OperationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnsupportedOperationType(s.to_string()))
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a transaction body needs, gathered from one operation list.
///
/// Amounts keep their Rosetta sign: inputs are negative, outputs and
/// withdrawals positive.
#[derive(Debug, Clone, Default)]
pub struct TransactionIntent {
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub certs: Vec<Certificate>,
    /// Keyed by reward account; an account may appear once.
    pub withdrawals: Withdrawals,
    pub input_amounts: Vec<i128>,
    pub output_amounts: Vec<i128>,
    pub withdrawal_amounts: Vec<i128>,
    pub stake_key_registrations: u64,
    pub stake_key_deregistrations: u64,
    pub pool_registrations: u64,
    /// Addresses (or pool key hashes) whose keys must sign the body.
    pub signers: BTreeSet<String>,
    /// Serialized auxiliary data from a vote registration.
    pub auxiliary_data: Option<Vec<u8>>,
}

impl TransactionIntent {
    /// Deposit and refund sums for the registrations in this intent.
    pub fn deposit_totals(&self, deposits: Deposits) -> DepositTotals {
        let key = i128::from(deposits.key_deposit);
        let pool = i128::from(deposits.pool_deposit);
        DepositTotals {
            key_refunds: i128::from(self.stake_key_deregistrations) * key,
            key_deposits: i128::from(self.stake_key_registrations) * key,
            pool_deposits: i128::from(self.pool_registrations) * pool,
        }
    }
}
