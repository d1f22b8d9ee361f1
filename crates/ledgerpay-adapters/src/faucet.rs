use std::time::Duration;

use serde_json::Value;

use ledgerpay_core::{AccountId, PortError};

/// Setup-time helper: asks a faucet service to create and fund an account.
/// Not part of the submission workflow.
pub struct FaucetClient {
    base_url: String,
    client: reqwest::Client,
}

impl FaucetClient {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| PortError::Transport(format!("faucet client init failed: {e}")))?;
        let base_url: String = base_url.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    pub async fn fund(&self, account: &AccountId) -> Result<Value, PortError> {
        let url = format!("{}/fund?addr={account}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("faucet request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::Transport(format!("faucet response not JSON: {e}")))?;
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "faucet status {status}: {body}"
            )));
        }
        Ok(body)
    }
}
