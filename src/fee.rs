//! Rosetta fee arithmetic.
//!
//! The fee is whatever the operations leave unaccounted for:
//! `Σ|inputs| + Σwithdrawals + key refunds − Σ|outputs| − key deposits − pool deposits`.

use crate::error::{Error, Result};

/// Deposit and refund sums in lovelace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepositTotals {
    pub key_refunds: i128,
    pub key_deposits: i128,
    pub pool_deposits: i128,
}

/// Compute the implicit fee of a set of amounts.
///
/// Fails with `NegativeWithdrawalAmount` on any negative withdrawal, with
/// `OutputsExceedInputs` when the result would be negative and with
/// `TransactionInputsParametersMissing` when a sum leaves the i128 range.
pub fn compute_fee(
    input_amounts: &[i128],
    output_amounts: &[i128],
    withdrawal_amounts: &[i128],
    deposits: DepositTotals,
) -> Result<u64> {
    if withdrawal_amounts.iter().any(|w| *w < 0) {
        return Err(Error::NegativeWithdrawalAmount);
    }
    let inputs = sum_magnitudes(input_amounts)?;
    let outputs = sum_magnitudes(output_amounts)?;
    let withdrawals = sum_magnitudes(withdrawal_amounts)?;

    let fee = inputs
        .checked_add(withdrawals)
        .and_then(|v| v.checked_add(deposits.key_refunds))
        .and_then(|v| v.checked_sub(outputs))
        .and_then(|v| v.checked_sub(deposits.key_deposits))
        .and_then(|v| v.checked_sub(deposits.pool_deposits))
        .ok_or_else(out_of_range)?;
    tracing::debug!(inputs, outputs, withdrawals, fee, "computed fee");

    if fee < 0 {
        return Err(Error::OutputsExceedInputs);
    }
    u64::try_from(fee).map_err(|_| Error::Unspecified(format!("Fee {fee} does not fit in u64")))
}

fn sum_magnitudes(amounts: &[i128]) -> Result<i128> {
    amounts.iter().try_fold(0i128, |acc, a| {
        a.checked_abs()
            .and_then(|a| acc.checked_add(a))
            .ok_or_else(out_of_range)
    })
}

fn out_of_range() -> Error {
    Error::TransactionInputsParametersMissing("Amounts are out of range".to_string())
}
