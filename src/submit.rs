//! Transaction submission to a cardano-submit-api endpoint.

use crate::error::{Error, Result};
use std::time::Duration;

const SUBMIT_PATH: &str = "/api/submit/tx";
const CONTENT_TYPE_CBOR: &str = "application/cbor";
const HTTP_ACCEPTED: u16 = 202;

/// Length of a quoted transaction hash: 64 hex digits plus two quotes.
const QUOTED_HASH_LEN: usize = 66;

/// Raw HTTP answer of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub status: u16,
    pub body: String,
}

/// Anything that can deliver signed transaction bytes to the network.
pub trait SubmissionClient {
    fn submit(&self, tx_bytes: &[u8]) -> Result<SubmitResponse>;
}

/// Posts CBOR to `{base_url}/api/submit/tx`.
#[derive(Debug, Clone)]
pub struct HttpSubmitClient {
    url: String,
    timeout: Duration,
}

impl HttpSubmitClient {
    pub fn new(base_url: &str) -> Self {
        HttpSubmitClient {
            url: format!("{}{}", base_url.trim_end_matches('/'), SUBMIT_PATH),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SubmissionClient for HttpSubmitClient {
    fn submit(&self, tx_bytes: &[u8]) -> Result<SubmitResponse> {
        tracing::info!(url = %self.url, bytes = tx_bytes.len(), "submitting transaction");
        let result = ureq::post(&self.url)
            .timeout(self.timeout)
            .set("Content-Type", CONTENT_TYPE_CBOR)
            .send_bytes(tx_bytes);

        let response = match result {
            Ok(response) => response,
            // Non-2xx answers still carry the node's explanation.
            Err(ureq::Error::Status(_, response)) => response,
            Err(e) => {
                return Err(Error::SendTransaction(format!(
                    "Transaction submit error: {e}"
                )));
            }
        };
        let status = response.status();
        let body = response
            .into_string()
            .map_err(|e| Error::SendTransaction(format!("Transaction submit error: {e}")))?;
        tracing::debug!(status, body = %body, "submit api answered");
        Ok(SubmitResponse { status, body })
    }
}

/// Map a submit-api answer to the transaction hash it accepted.
pub fn interpret(response: SubmitResponse) -> Result<String> {
    let SubmitResponse { status, body } = response;
    if status != HTTP_ACCEPTED {
        tracing::error!(status, body = %body, "transaction rejected");
        return Err(Error::SendTransaction(format!(
            "Transaction submit error: {body}"
        )));
    }
    let trimmed = body.trim();
    if trimmed.len() == QUOTED_HASH_LEN && trimmed.starts_with('"') && trimmed.ends_with('"') {
        return Ok(trimmed[1..QUOTED_HASH_LEN - 1].to_string());
    }
    Err(Error::SendTransaction(format!(
        "Transaction hash format error: {body}"
    )))
}

/// Submit and return the accepted transaction hash.
pub fn submit(client: &dyn SubmissionClient, tx_bytes: &[u8]) -> Result<String> {
    interpret(client.submit(tx_bytes)?)
}
