use std::fmt;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ed25519_dalek::{Signer as _, SigningKey};

use ledgerpay_core::{
    AccountId, DecoratedSignature, PortError, SignedEnvelope, TransactionEnvelope, TransferSigner,
};

/// Signs envelopes with a raw ed25519 credential held in memory.
///
/// The seed is never persisted and never rendered: `Debug` shows only the
/// derived account, and parse errors describe the expected encodings without
/// echoing the input.
pub struct LocalSigner {
    key: SigningKey,
    account: AccountId,
}

impl LocalSigner {
    /// Accepts `ed25519-priv-0x<hex>`, bare 64-character hex (0x optional),
    /// or base64 of the 32-byte seed.
    pub fn from_secret(raw: &str) -> Result<Self, PortError> {
        let raw = raw.trim();
        let stripped = raw
            .strip_prefix("ed25519-priv-")
            .unwrap_or(raw)
            .trim_start_matches("0x");

        let decoded = if stripped.len() == 64 && stripped.bytes().all(|b| b.is_ascii_hexdigit()) {
            hex::decode(stripped)
                .map_err(|_| PortError::Validation("unrecognized secret key encoding".to_owned()))?
        } else {
            BASE64
                .decode(raw)
                .map_err(|_| PortError::Validation("unrecognized secret key encoding".to_owned()))?
        };

        let seed: [u8; 32] = decoded.try_into().map_err(|_| {
            PortError::Validation("secret key must decode to exactly 32 bytes".to_owned())
        })?;
        Ok(Self::from_signing_key(SigningKey::from_bytes(&seed)))
    }

    pub fn from_signing_key(key: SigningKey) -> Self {
        let account = AccountId::from_bytes(key.verifying_key().to_bytes());
        Self { key, account }
    }

    pub fn account(&self) -> AccountId {
        self.account
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("account", &self.account)
            .field("seed", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl TransferSigner for LocalSigner {
    async fn active_account(&self) -> Result<AccountId, PortError> {
        Ok(self.account)
    }

    async fn sign(&self, envelope: &TransactionEnvelope) -> Result<SignedEnvelope, PortError> {
        let hash = envelope
            .hash()
            .map_err(|e| PortError::Validation(e.to_string()))?;
        let signature = self.key.sign(&hash);
        Ok(SignedEnvelope {
            envelope: envelope.clone(),
            signatures: vec![DecoratedSignature {
                hint: self.account.hint(),
                signature: signature.to_bytes().to_vec(),
            }],
        })
    }
}
