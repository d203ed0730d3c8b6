//! The Rosetta construction flows: derive, preprocess, metadata, payloads,
//! parse, combine, hash and submit.
//!
//! Every flow takes a request document and returns a response document. The
//! network and the protocol parameters are fixed per [`Construction`].

use crate::address::{derive_address, AddressType};
use crate::builder::{self, estimate_size, min_fee, update_tx_size};
use crate::combiner::{self, Witness};
use crate::config::{Deposits, ProtocolParams, DEFAULT_RELATIVE_TTL};
use crate::error::{Error, Result};
use crate::model::api::{
    CombineRequest, CombineResponse, ConstructionMetadata, DeriveRequest, DeriveResponse,
    MetadataRequest, MetadataResponse, ParseRequest, ParseResponse, PayloadsRequest,
    PayloadsResponse, PreprocessOptions, PreprocessRequest, PreprocessResponse, Signature,
    SignedTransactionRequest, SigningPayload, TransactionIdentifier,
    TransactionIdentifierResponse, SIGNATURE_TYPE_ED25519,
};
use crate::model::{AccountIdentifier, Amount};
use crate::network::Network;
use crate::parser::{self, unwrap_if_needed};
use crate::submit::{self, SubmissionClient};
use crate::tx::{DecodedTransaction, Envelope, ExtraData};

/// Construction flows bound to one network and one set of protocol parameters.
#[derive(Debug, Clone)]
pub struct Construction {
    network: Network,
    params: ProtocolParams,
}

impl Construction {
    pub fn new(network: Network, params: ProtocolParams) -> Self {
        Construction { network, params }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    /// Address of a public key. Enterprise unless the metadata asks otherwise.
    pub fn derive(&self, request: &DeriveRequest) -> Result<DeriveResponse> {
        let metadata = request.metadata.clone().unwrap_or_default();
        let address_type = metadata
            .address_type
            .as_deref()
            .map(str::parse::<AddressType>)
            .transpose()?;
        let address = derive_address(
            self.network,
            request.public_key.as_ref(),
            address_type,
            metadata.staking_credential.as_ref(),
        )?;
        tracing::info!(%address, "derived address");
        Ok(DeriveResponse {
            account_identifier: AccountIdentifier::new(address),
        })
    }

    /// Estimate the signed size of the operations, built with a zero TTL.
    pub fn preprocess(&self, request: &PreprocessRequest) -> Result<PreprocessResponse> {
        let metadata = request.metadata.clone().unwrap_or_default();
        let relative_ttl = metadata.relative_ttl.unwrap_or(DEFAULT_RELATIVE_TTL);
        let deposits =
            Deposits::resolve(metadata.deposit_parameters.as_ref(), self.params.deposits())?;
        let transaction_size =
            estimate_size(self.network, &request.operations, 0, Some(deposits))?;
        tracing::info!(
            operations = request.operations.len(),
            relative_ttl,
            transaction_size,
            "preprocessed operations"
        );
        Ok(PreprocessResponse {
            options: PreprocessOptions {
                relative_ttl,
                transaction_size,
            },
        })
    }

    /// Absolute TTL and suggested fee for the preprocessed size.
    pub fn metadata(&self, request: &MetadataRequest) -> Result<MetadataResponse> {
        let tip = request
            .tip_slot
            .ok_or_else(|| Error::Unspecified("Missing chain tip slot".to_string()))?;
        let PreprocessOptions {
            relative_ttl,
            transaction_size,
        } = request.options;
        let ttl = tip.saturating_add(relative_ttl);
        let size = update_tx_size(transaction_size, 0, ttl);
        let fee = min_fee(size, &self.params);
        tracing::info!(tip, ttl, size, fee, "suggested fee");
        Ok(MetadataResponse {
            metadata: ConstructionMetadata {
                ttl: ttl.to_string(),
                protocol_parameters: self.params.clone(),
            },
            suggested_fee: vec![Amount::lovelace(fee)],
        })
    }

    /// Build the wrapped unsigned transaction and one payload per signer.
    pub fn payloads(&self, request: &PayloadsRequest) -> Result<PayloadsResponse> {
        let metadata = request
            .metadata
            .as_ref()
            .ok_or_else(|| Error::Unspecified("Missing ttl metadata".to_string()))?;
        let ttl = metadata
            .ttl
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::Unspecified(format!("Invalid ttl {}", metadata.ttl)))?;
        let params = metadata.protocol_parameters.as_ref().unwrap_or(&self.params);

        let unsigned = builder::build(self.network, &request.operations, ttl, params, None)?;
        let extra = ExtraData::from_operations(
            &request.operations,
            unsigned.auxiliary_data_bytes.as_deref(),
        );
        let unsigned_transaction = Envelope::new(&unsigned.cbor_bytes, extra).encode()?;

        let hash = unsigned.body_hash_hex();
        let payloads = unsigned
            .required_signer_addresses
            .iter()
            .map(|address| SigningPayload {
                account_identifier: Some(AccountIdentifier::new(address.as_str())),
                hex_bytes: hash.clone(),
                signature_type: Some(SIGNATURE_TYPE_ED25519.to_string()),
            })
            .collect::<Vec<_>>();
        tracing::info!(%hash, payloads = payloads.len(), "created signing payloads");
        Ok(PayloadsResponse {
            unsigned_transaction,
            payloads,
        })
    }

    pub fn parse(&self, request: &ParseRequest) -> Result<ParseResponse> {
        let parsed = parser::parse(self.network, &request.transaction, request.signed)?;
        Ok(ParseResponse {
            operations: parsed.operations,
            account_identifier_signers: parsed.signers,
        })
    }

    /// Attach the signatures, keeping the extra data of the unsigned wrapper.
    pub fn combine(&self, request: &CombineRequest) -> Result<CombineResponse> {
        let envelope = Envelope::decode(&request.unsigned_transaction)?;
        let body = envelope.tx_bytes()?;
        let aux_data = envelope.extra.aux_data()?;
        let witnesses: Vec<Witness> = request.signatures.iter().map(witness_of).collect();

        let signed = combiner::combine(&body, &witnesses, aux_data.as_deref())?;
        let signed_transaction = Envelope::new(&signed, envelope.extra).encode()?;
        tracing::info!(signatures = witnesses.len(), bytes = signed.len(), "combined signatures");
        Ok(CombineResponse { signed_transaction })
    }

    /// Blake2b-256 of the body of a wrapped or raw signed transaction.
    pub fn hash(&self, request: &SignedTransactionRequest) -> Result<TransactionIdentifierResponse> {
        let bytes = signed_bytes(&request.signed_transaction)?;
        let tx = DecodedTransaction::decode(&bytes).map_err(|e| {
            tracing::error!(error = %e, "cannot decode signed transaction");
            Error::ParseSignedTransaction
        })?;
        let hash = tx.hash().to_hex();
        tracing::debug!(%hash, "hashed transaction body");
        Ok(identifier(hash))
    }

    /// Send the signed transaction through `client`.
    pub fn submit(
        &self,
        client: &dyn SubmissionClient,
        request: &SignedTransactionRequest,
    ) -> Result<TransactionIdentifierResponse> {
        let bytes = signed_bytes(&request.signed_transaction)?;
        let hash = submit::submit(client, &bytes)?;
        tracing::info!(%hash, "transaction accepted");
        Ok(identifier(hash))
    }
}

fn witness_of(signature: &Signature) -> Witness {
    let account = signature.signing_payload.account_identifier.as_ref();
    Witness {
        public_key: signature.public_key.hex_bytes.clone(),
        signature: signature.hex_bytes.clone(),
        chain_code: account
            .and_then(|a| a.metadata.as_ref())
            .and_then(|m| m.chain_code.clone()),
        address: account.map(|a| a.address.clone()),
    }
}

fn signed_bytes(signed_transaction: &str) -> Result<Vec<u8>> {
    let tx_hex = unwrap_if_needed(signed_transaction)?;
    hex::decode(tx_hex.trim()).map_err(|_| Error::ParseSignedTransaction)
}

fn identifier(hash: String) -> TransactionIdentifierResponse {
    TransactionIdentifierResponse {
        transaction_identifier: TransactionIdentifier { hash },
    }
}
