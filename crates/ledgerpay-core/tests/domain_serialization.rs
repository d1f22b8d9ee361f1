use ledgerpay_core::{
    AccountId, AccountSnapshot, Balance, FeePolicy, PaymentIntent, PaymentRequest, SubmitError,
};

fn account(seed: u8) -> AccountId {
    AccountId::from_bytes([seed; 32])
}

#[test]
fn account_id_text_round_trip() {
    let id = account(0xAB);
    let text = id.to_string();
    assert!(text.starts_with("0x"));
    assert_eq!(text.len(), 66);
    let parsed: AccountId = text.parse().expect("parse canonical form");
    assert_eq!(parsed, id);

    // Prefix optional, case-insensitive.
    let bare: AccountId = text.trim_start_matches("0x").to_uppercase().parse().expect("bare hex");
    assert_eq!(bare, id);
}

#[test]
fn account_id_rejects_malformed_input() {
    assert!("".parse::<AccountId>().is_err());
    assert!("0x1234".parse::<AccountId>().is_err());
    assert!("zz".repeat(32).parse::<AccountId>().is_err());
}

#[test]
fn account_id_serializes_as_hex_string() {
    let id = account(1);
    let json = serde_json::to_string(&id).expect("serialize");
    assert_eq!(json, format!("\"{id}\""));
    let back: AccountId = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, id);
}

#[test]
fn snapshot_native_balance_lookup() {
    let snapshot = AccountSnapshot {
        id: account(2),
        sequence: 7,
        balances: vec![
            Balance {
                asset: "credit:USD".to_owned(),
                amount: "12.5".to_owned(),
            },
            Balance {
                asset: "native".to_owned(),
                amount: "50".to_owned(),
            },
        ],
    };
    assert_eq!(snapshot.native_balance(), Some("50"));

    let encoded = serde_json::to_vec(&snapshot).expect("serialize snapshot");
    let decoded: AccountSnapshot = serde_json::from_slice(&encoded).expect("deserialize snapshot");
    assert_eq!(decoded, snapshot);
}

fn request(amount: &str) -> PaymentRequest {
    PaymentRequest {
        destination: account(3).to_string(),
        amount: amount.to_owned(),
        fee: FeePolicy::Fixed(100),
        timeout_secs: 30,
    }
}

#[test]
fn intent_accepts_positive_decimal_amounts() {
    let intent = PaymentIntent::from_request(&request("10")).expect("whole amount");
    assert_eq!(intent.amount_text(), "10");
    let intent = PaymentIntent::from_request(&request("0.0000001")).expect("smallest unit");
    assert_eq!(intent.amount_text(), "0.0000001");
    // Trailing zeros normalize away.
    let intent = PaymentIntent::from_request(&request("2.500")).expect("trailing zeros");
    assert_eq!(intent.amount_text(), "2.5");
}

#[test]
fn intent_rejects_non_positive_and_non_numeric_amounts() {
    for bad in ["-5", "0", "0.0", "ten", "", "1e3"] {
        let err = PaymentIntent::from_request(&request(bad)).expect_err("must reject");
        assert!(
            matches!(err, SubmitError::InvalidIntent(_)),
            "amount {bad:?} gave {err:?}"
        );
    }
}

#[test]
fn intent_rejects_over_precise_amount() {
    let err = PaymentIntent::from_request(&request("1.00000001")).expect_err("8 fractional digits");
    assert!(matches!(err, SubmitError::InvalidIntent(_)));
}

#[test]
fn intent_rejects_bad_destination_zero_timeout_and_low_fee() {
    let mut bad_dest = request("1");
    bad_dest.destination = "not-an-account".to_owned();
    assert!(matches!(
        PaymentIntent::from_request(&bad_dest),
        Err(SubmitError::InvalidIntent(_))
    ));

    let mut no_timeout = request("1");
    no_timeout.timeout_secs = 0;
    assert!(matches!(
        PaymentIntent::from_request(&no_timeout),
        Err(SubmitError::InvalidIntent(_))
    ));

    let mut cheap = request("1");
    cheap.fee = FeePolicy::Fixed(1);
    assert!(matches!(
        PaymentIntent::from_request(&cheap),
        Err(SubmitError::InvalidIntent(_))
    ));
}
