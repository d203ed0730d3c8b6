//! rosetta-construct - Rosetta Construction API engine for Cardano.
//!
//! Turns Rosetta operations into Conway-era CBOR transactions and back.
//!
//! # Features
//!
//! - Derive Shelley addresses from Ed25519 public keys
//! - Estimate transaction size and suggest a fee
//! - Build unsigned transactions and their signing payloads
//! - Parse signed or unsigned transactions back into operations
//! - Attach signatures, including Byron bootstrap witnesses
//! - Hash and submit signed transactions
//! - Pretty terminal output or JSON for piping

pub mod address;
pub mod builder;
pub mod cli;
pub mod combiner;
pub mod config;
pub mod construction;
pub mod crypto;
pub mod error;
pub mod fee;
pub mod format;
pub mod input;
pub mod intent;
pub mod model;
pub mod network;
pub mod parser;
pub mod submit;
pub mod tx;

pub use cli::{Args, Command};
pub use construction::Construction;
pub use error::{Error, Result};
pub use network::Network;

use config::ProtocolParams;
use format::{format_json, format_output, Render};
use input::{read_input, Document};
use model::api::{ParseRequest, SignedTransactionRequest};
use serde::de::DeserializeOwned;
use std::time::Duration;
use submit::HttpSubmitClient;

/// Run rosetta-construct with the given arguments.
pub fn run(args: &Args) -> Result<()> {
    let output = match &args.command {
        Command::Address { address } => format_address(address, args)?,
        command => {
            let params = ProtocolParams::load(args.protocol_params.as_deref())?;
            let service = Construction::new(args.network, params);
            let document = read_input(&command.input_spec())?;
            execute(&service, command, &document, args)?
        }
    };
    println!("{}", output);
    Ok(())
}

/// Run one construction flow and format its response.
fn execute(
    service: &Construction,
    command: &Command,
    document: &Document,
    args: &Args,
) -> Result<String> {
    tracing::debug!(network = %service.network(), ?command, "running flow");
    match command {
        Command::Derive { .. } => format_output(&service.derive(&json(document)?)?, args),
        Command::Preprocess { .. } => format_output(&service.preprocess(&json(document)?)?, args),
        Command::Metadata { tip_slot, .. } => {
            let mut request: model::api::MetadataRequest = json(document)?;
            if tip_slot.is_some() {
                request.tip_slot = *tip_slot;
            }
            format_output(&service.metadata(&request)?, args)
        }
        Command::Payloads { .. } => format_output(&service.payloads(&json(document)?)?, args),
        Command::Parse { signed, .. } => {
            let request = match document {
                Document::Hex(hex) => ParseRequest {
                    signed: *signed,
                    transaction: hex.clone(),
                },
                Document::Json(_) => json(document)?,
            };
            format_output(&service.parse(&request)?, args)
        }
        Command::Combine { .. } => format_output(&service.combine(&json(document)?)?, args),
        Command::Hash { .. } => format_output(&service.hash(&signed_request(document)?)?, args),
        Command::Submit {
            submit_url,
            timeout,
            ..
        } => {
            let client =
                HttpSubmitClient::new(submit_url).with_timeout(Duration::from_secs(*timeout));
            let response = service.submit(&client, &signed_request(document)?)?;
            format_output(&response, args)
        }
        Command::Address { address } => format_address(address, args),
    }
}

fn json<T: DeserializeOwned>(document: &Document) -> Result<T> {
    let text = match document {
        Document::Json(text) | Document::Hex(text) => text,
    };
    Ok(serde_json::from_str(text)?)
}

/// A signed transaction given either as a request document or as bare hex.
fn signed_request(document: &Document) -> Result<SignedTransactionRequest> {
    match document {
        Document::Hex(hex) => Ok(SignedTransactionRequest {
            signed_transaction: hex.clone(),
        }),
        Document::Json(_) => json(document),
    }
}

fn format_address(address: &str, args: &Args) -> Result<String> {
    let components = address::parse_address(address)?;
    if args.json {
        format_json(&components.to_json())
    } else {
        components.render(args)
    }
}
