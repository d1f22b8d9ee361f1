#![allow(dead_code)]

use ed25519_dalek::SigningKey;

use ledgerpay_core::{AccountId, FeePolicy, NetworkConfig, PaymentRequest};

pub fn keypair(seed: u8) -> (SigningKey, AccountId) {
    let key = SigningKey::from_bytes(&[seed; 32]);
    let id = AccountId::from_bytes(key.verifying_key().to_bytes());
    (key, id)
}

pub fn network() -> NetworkConfig {
    NetworkConfig::new("ledgerpay test network ; 2026")
}

pub fn payment_request(destination: AccountId, amount: &str) -> PaymentRequest {
    PaymentRequest {
        destination: destination.to_string(),
        amount: amount.to_owned(),
        fee: FeePolicy::Fixed(100),
        timeout_secs: 60,
    }
}
