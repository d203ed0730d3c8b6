//! Pretty terminal output with colors and tables.

use super::Render;
use crate::address::AddressComponents;
use crate::cli::Args;
use crate::config::ProtocolParams;
use crate::error::Result;
use crate::model::api::{
    CombineResponse, DeriveResponse, MetadataResponse, ParseResponse, PayloadsResponse,
    PreprocessResponse, TransactionIdentifierResponse,
};
use crate::model::{Amount, Operation, OperationMetadata, ADA};
use colored::Colorize;
use comfy_table::{Cell, ContentArrangement, Table, presets};

const LOVELACE_PER_ADA: u128 = 1_000_000;

impl Render for DeriveResponse {
    fn render(&self, _args: &Args) -> Result<String> {
        Ok(format!(
            "{}\n  {}\n",
            "Address".bold().cyan(),
            self.account_identifier.address.yellow()
        ))
    }
}

impl Render for PreprocessResponse {
    fn render(&self, _args: &Args) -> Result<String> {
        let mut output = format!("{}\n", "Options".bold().cyan());
        output.push_str(&format!(
            "  {} {}\n",
            "Relative TTL:".dimmed(),
            self.options.relative_ttl
        ));
        output.push_str(&format!(
            "  {} {} bytes\n",
            "Transaction size:".dimmed(),
            format_number_with_separators(self.options.transaction_size.into())
        ));
        Ok(output)
    }
}

impl Render for MetadataResponse {
    fn render(&self, args: &Args) -> Result<String> {
        let mut output = format!("{}\n", "Metadata".bold().cyan());
        output.push_str(&format!("  {} {}\n", "TTL:".dimmed(), self.metadata.ttl));
        for fee in &self.suggested_fee {
            output.push_str(&format!(
                "  {} {}\n",
                "Suggested fee:".dimmed(),
                format_amount(fee, args)
            ));
        }
        output.push('\n');
        output.push_str(&format!("{}\n", "Protocol Parameters".bold().cyan()));
        output.push_str(&format_protocol_params(&self.metadata.protocol_parameters, args));
        Ok(output)
    }
}

impl Render for PayloadsResponse {
    fn render(&self, _args: &Args) -> Result<String> {
        let mut output = format!("{}\n", "Unsigned Transaction".bold().cyan());
        output.push_str(&format!("  {}\n\n", self.unsigned_transaction));

        output.push_str(&format!(
            "{} ({})\n",
            "Signing Payloads".bold().cyan(),
            self.payloads.len()
        ));
        let mut table = new_table(&["#", "Account", "Bytes", "Type"]);
        for (idx, payload) in self.payloads.iter().enumerate() {
            let account = payload
                .account_identifier
                .as_ref()
                .map(|a| truncate_address(&a.address, 32))
                .unwrap_or_else(|| "-".to_string());
            table.add_row(vec![
                Cell::new(idx),
                Cell::new(account),
                Cell::new(truncate_hash(&payload.hex_bytes, 24)),
                Cell::new(payload.signature_type.as_deref().unwrap_or("-")),
            ]);
        }
        output.push_str(&format!("{}\n", table));
        Ok(output)
    }
}

impl Render for ParseResponse {
    fn render(&self, args: &Args) -> Result<String> {
        let mut output = format!(
            "{} ({})\n",
            "Operations".bold().cyan(),
            self.operations.len()
        );
        output.push_str(&format_operations_table(&self.operations, args));

        if !self.account_identifier_signers.is_empty() {
            output.push('\n');
            output.push_str(&format!("{}\n", "Signers".bold().cyan()));
            for signer in &self.account_identifier_signers {
                output.push_str(&format!("  {}\n", signer.address));
            }
        }
        Ok(output)
    }
}

impl Render for CombineResponse {
    fn render(&self, _args: &Args) -> Result<String> {
        Ok(format!(
            "{}\n  {}\n",
            "Signed Transaction".bold().cyan(),
            self.signed_transaction
        ))
    }
}

impl Render for TransactionIdentifierResponse {
    fn render(&self, _args: &Args) -> Result<String> {
        Ok(format!(
            "{}\n  {} {}\n",
            "Transaction".bold().cyan(),
            "Hash:".dimmed(),
            self.transaction_identifier.hash.yellow()
        ))
    }
}

impl Render for AddressComponents {
    fn render(&self, _args: &Args) -> Result<String> {
        let mut output = format!("{}\n", "Address".bold().cyan());
        output.push_str(&format!("  {} {}\n", "Address:".dimmed(), self.address.yellow()));
        output.push_str(&format!(
            "  {} {}\n",
            "Type:".dimmed(),
            self.address_type.description()
        ));
        output.push_str(&format!("  {} {}\n", "Era:".dimmed(), self.era.as_str()));
        output.push_str(&format!("  {} {}\n", "Network:".dimmed(), self.network.as_str()));

        if let Some(payment) = &self.payment_credential {
            output.push_str(&format!(
                "  {} {} ({})\n",
                "Payment:".dimmed(),
                payment.hex(),
                payment.cred_type.as_str()
            ));
        }
        if let Some(stake) = &self.stake_credential {
            output.push_str(&format!(
                "  {} {} ({})\n",
                "Stake:".dimmed(),
                stake.hex(),
                stake.cred_type.as_str()
            ));
        }
        if let Some(ptr) = &self.pointer {
            output.push_str(&format!(
                "  {} slot {}, tx {}, cert {}\n",
                "Pointer:".dimmed(),
                ptr.slot,
                ptr.tx_index,
                ptr.cert_index
            ));
        }
        output.push_str(&format!(
            "  {} {}\n",
            "Hex:".dimmed(),
            truncate_hash(&hex::encode(&self.bytes), 40)
        ));
        Ok(output)
    }
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(comfy_table::Color::DarkGrey))
            .collect::<Vec<_>>(),
    );
    table
}

/// Format operations as a table.
fn format_operations_table(operations: &[Operation], args: &Args) -> String {
    let mut table = new_table(&["#", "Type", "Account", "Amount", "Details"]);

    for op in operations {
        let account = op
            .account_address()
            .map(|a| truncate_address(a, 24))
            .unwrap_or_else(|| "-".dimmed().to_string());

        let amount = match &op.amount {
            Some(amount) => {
                let tokens = op
                    .metadata
                    .as_ref()
                    .and_then(|m| m.token_bundle.as_ref())
                    .map(|bundle| bundle.iter().map(|b| b.tokens.len()).sum::<usize>())
                    .unwrap_or(0);
                if tokens == 0 {
                    format_amount(amount, args)
                } else {
                    format!("{} + {} token(s)", format_amount(amount, args), tokens)
                }
            }
            None => "-".dimmed().to_string(),
        };

        let details = match &op.coin_change {
            Some(change) => truncate_hash(&change.coin_identifier.identifier, 24),
            None => op
                .metadata
                .as_ref()
                .map(|m| format_metadata_details(m, args))
                .unwrap_or_else(|| "-".to_string()),
        };

        table.add_row(vec![
            Cell::new(op.operation_identifier.index),
            Cell::new(&op.kind),
            Cell::new(account),
            Cell::new(amount),
            Cell::new(details),
        ]);
    }

    format!("{}\n", table)
}

/// One-line summary of the type-specific metadata of an operation.
fn format_metadata_details(metadata: &OperationMetadata, args: &Args) -> String {
    let mut parts = Vec::new();
    if let Some(key) = &metadata.staking_credential {
        parts.push(format!("key: {}", truncate_hash(&key.hex_bytes, 16)));
    }
    if let Some(pool) = &metadata.pool_key_hash {
        parts.push(format!("pool: {}", truncate_hash(pool, 16)));
    }
    if let Some(amount) = &metadata.withdrawal_amount {
        parts.push(format!("withdraw: {}", format_amount(amount, args)));
    }
    if let Some(amount) = &metadata.deposit_amount {
        parts.push(format!("deposit: {}", format_amount(amount, args)));
    }
    if let Some(amount) = &metadata.refund_amount {
        parts.push(format!("refund: {}", format_amount(amount, args)));
    }
    if let Some(epoch) = metadata.epoch {
        parts.push(format!("epoch: {}", epoch));
    }
    if let Some(params) = &metadata.pool_registration_params {
        parts.push(format!("owners: {}", params.pool_owners.len()));
    }
    if let Some(nonce) = metadata
        .vote_registration_metadata
        .as_ref()
        .and_then(|v| v.voting_nonce)
    {
        parts.push(format!("vote nonce: {}", nonce));
    }
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(", ")
    }
}

fn format_protocol_params(params: &ProtocolParams, args: &Args) -> String {
    let lovelace = |n: u64| format_lovelace(n.into(), args);
    let mut table = new_table(&["Parameter", "Value"]);
    for (name, value) in [
        ("minFeeA", params.min_fee_a.to_string()),
        ("minFeeB", lovelace(params.min_fee_b)),
        ("maxTxSize", format_number_with_separators(params.max_tx_size.into())),
        ("keyDeposit", lovelace(params.key_deposit)),
        ("poolDeposit", lovelace(params.pool_deposit)),
        ("coinsPerUtxoByte", params.coins_per_utxo_byte.to_string()),
        ("maxValSize", params.max_value_size.to_string()),
    ] {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    format!("{}\n", table)
}

/// Format a Rosetta amount. ADA values follow `--ada`; tokens show their symbol.
fn format_amount(amount: &Amount, args: &Args) -> String {
    match amount.value.parse::<i128>() {
        Ok(value) if amount.currency.symbol == ADA => format_lovelace(value, args),
        Ok(value) => format!("{} {}", format_signed(value), amount.currency.symbol),
        Err(_) => format!("{} {}", amount.value, amount.currency.symbol),
    }
}

/// Format lovelace amount, optionally as ADA.
fn format_lovelace(lovelace: i128, args: &Args) -> String {
    if args.ada {
        let sign = if lovelace < 0 { "-" } else { "" };
        let abs = lovelace.unsigned_abs();
        format!(
            "{}{}.{:06} ADA",
            sign,
            abs / LOVELACE_PER_ADA,
            abs % LOVELACE_PER_ADA
        )
    } else {
        format!("{} lovelace", format_signed(lovelace))
    }
}

fn format_signed(n: i128) -> String {
    let digits = format_number_with_separators(n.unsigned_abs());
    if n < 0 { format!("-{}", digits) } else { digits }
}

/// Format a number with thousand separators.
fn format_number_with_separators(n: u128) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Truncate a hash for display.
fn truncate_hash(hash: &str, max_len: usize) -> String {
    if hash.len() <= max_len || !hash.is_ascii() {
        hash.to_string()
    } else {
        let half = (max_len - 3) / 2;
        format!("{}...{}", &hash[..half], &hash[hash.len() - half..])
    }
}

/// Truncate an address for display, keeping the bech32 prefix visible.
fn truncate_address(addr: &str, max_len: usize) -> String {
    if addr.len() <= max_len || !addr.is_ascii() {
        return addr.to_string();
    }
    let suffix_len = 8;
    let prefix_end = addr.find('1').map(|i| i + 1).unwrap_or(5);
    let prefix_len = (max_len - suffix_len - 3).max(prefix_end).min(addr.len() - suffix_len);
    format!("{}...{}", &addr[..prefix_len], &addr[addr.len() - suffix_len..])
}
