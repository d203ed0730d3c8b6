//! CLI argument parsing for rosetta-construct.

use crate::network::Network;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Rosetta Construction API engine for Cardano.
///
/// Turns Rosetta operations into Conway CBOR transactions and back. Every
/// command reads one request document from a file, an inline argument or stdin.
#[derive(Parser, Debug)]
#[command(
    name = "rosetta-construct",
    version,
    about = "Rosetta Construction API engine for Cardano",
    after_help = r#"EXAMPLES:
    rosetta-construct derive derive.json                 Address of a public key
    rosetta-construct preprocess ops.json --json         Estimate transaction size
    rosetta-construct metadata options.json --tip-slot 1000
    rosetta-construct payloads payloads.json             Unsigned tx and signing payloads
    rosetta-construct parse 82790...                     Operations of an unsigned tx
    rosetta-construct parse --signed signed.hex          Operations and signers
    rosetta-construct combine combine.json               Attach signatures
    rosetta-construct hash signed.hex                    Transaction hash
    rosetta-construct submit signed.hex --submit-url http://localhost:8090
    rosetta-construct addr addr1vxa5...                  Decode any Cardano address

ENVIRONMENT:
    ROSETTA_NETWORK          Network (mainnet, preprod, preview)
    ROSETTA_PROTOCOL_PARAMS  Protocol parameters JSON file
    ROSETTA_SUBMIT_URL       cardano-submit-api base URL
    RUST_LOG                 Log filter (overrides --verbose)"#
)]
pub struct Args {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Cardano network.
    #[arg(
        long,
        short = 'n',
        global = true,
        env = "ROSETTA_NETWORK",
        value_enum,
        default_value = "mainnet"
    )]
    pub network: Network,

    /// Protocol parameters JSON file. Built-in defaults are used when absent.
    #[arg(long, global = true, env = "ROSETTA_PROTOCOL_PARAMS", value_name = "FILE")]
    pub protocol_params: Option<PathBuf>,

    /// Output as JSON.
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Display ADA amounts instead of lovelace.
    #[arg(long, short = 'a', global = true)]
    pub ada: bool,

    /// Log each construction step to stderr.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Derive an address from a public key.
    Derive {
        /// Derive request: file path or inline JSON. Reads stdin when omitted.
        input: Option<String>,
    },

    /// Estimate the size of the transaction an operation set produces.
    Preprocess {
        /// Preprocess request: file path or inline JSON.
        input: Option<String>,
    },

    /// Compute the TTL and suggested fee from preprocess options.
    Metadata {
        /// Metadata request: file path or inline JSON.
        input: Option<String>,

        /// Current chain tip slot. Overrides `tip_slot` in the request.
        #[arg(long)]
        tip_slot: Option<u64>,
    },

    /// Build the unsigned transaction and its signing payloads.
    Payloads {
        /// Payloads request: file path or inline JSON.
        input: Option<String>,
    },

    /// Rebuild the operations of a transaction.
    ///
    /// Accepts a parse request document or a bare transaction in hex.
    Parse {
        /// Parse request or transaction hex: file path or inline.
        input: Option<String>,

        /// The transaction is signed (only used for bare hex input).
        #[arg(long, short = 's')]
        signed: bool,
    },

    /// Attach signatures to an unsigned transaction.
    Combine {
        /// Combine request: file path or inline JSON.
        input: Option<String>,
    },

    /// Hash a signed transaction.
    Hash {
        /// Signed transaction request or hex: file path or inline.
        input: Option<String>,
    },

    /// Submit a signed transaction to a cardano-submit-api endpoint.
    Submit {
        /// Signed transaction request or hex: file path or inline.
        input: Option<String>,

        /// Base URL of the submit API.
        #[arg(long, env = "ROSETTA_SUBMIT_URL")]
        submit_url: String,

        /// Request timeout in seconds.
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },

    /// Decode and display a Cardano address.
    ///
    /// Parses a bech32 Shelley or base58 Byron address and shows its
    /// type, network and credentials.
    #[command(name = "addr")]
    Address {
        /// The address to decode (addr1..., stake1..., Ae2..., DdzFF...).
        address: String,
    },
}

impl Command {
    /// Where the request document comes from.
    pub fn input_spec(&self) -> InputSpec {
        match self {
            Command::Derive { input }
            | Command::Preprocess { input }
            | Command::Metadata { input, .. }
            | Command::Payloads { input }
            | Command::Parse { input, .. }
            | Command::Combine { input }
            | Command::Hash { input }
            | Command::Submit { input, .. } => {
                input.as_deref().map_or(InputSpec::Stdin, InputSpec::detect)
            }
            Command::Address { address } => InputSpec::Inline(address.clone()),
        }
    }
}

/// Specifies how to obtain the request document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSpec {
    /// Read from stdin.
    Stdin,
    /// Read from a file path.
    File(PathBuf),
    /// JSON or hex given on the command line.
    Inline(String),
}

impl InputSpec {
    /// Detect input type from a string argument.
    pub fn detect(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.starts_with('{') || looks_like_hex(trimmed) {
            return InputSpec::Inline(trimmed.to_string());
        }
        InputSpec::File(PathBuf::from(s))
    }
}

/// At least one byte of hex, optional `0x` prefix.
fn looks_like_hex(s: &str) -> bool {
    let candidate = s.strip_prefix("0x").unwrap_or(s);
    candidate.len() >= 2
        && candidate.len() % 2 == 0
        && candidate.chars().all(|c| c.is_ascii_hexdigit())
}
