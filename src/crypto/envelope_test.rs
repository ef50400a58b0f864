use super::*;
use crate::test_support::{other_key, shared_key};
use serde_json::{Value, json};

#[test]
fn seal_then_open_text_returns_plaintext() {
    let key = shared_key();
    let sealed = seal_bytes(key.public(), "zażółć gęślą jaźń".as_bytes()).unwrap();
    assert_eq!(open_text(key, &sealed).unwrap(), "zażółć gęślą jaźń");
}

#[test]
fn open_decodes_json_payload() {
    let key = shared_key();
    let sealed = seal(key.public(), &json!({ "access_token": "abc", "token_type": "bearer" })).unwrap();

    #[derive(serde::Deserialize)]
    struct Token {
        access_token: String,
    }
    let token: Token = open(key, &sealed).unwrap();
    assert_eq!(token.access_token, "abc");
}

#[test]
fn open_tolerates_surrounding_whitespace() {
    let key = shared_key();
    let sealed = seal(key.public(), &json!(1)).unwrap();
    let value: Value = open(key, &format!("  {sealed}\n")).unwrap();
    assert_eq!(value, json!(1));
}

#[test]
fn sealing_twice_produces_different_ciphertexts() {
    let key = shared_key();
    let first = seal(key.public(), &json!("same")).unwrap();
    let second = seal(key.public(), &json!("same")).unwrap();
    assert_ne!(first, second);
}

#[test]
fn open_with_wrong_key_is_decrypt_error() {
    let sealed = seal(shared_key().public(), &json!({ "a": 1 })).unwrap();
    let err = open::<Value>(other_key(), &sealed).unwrap_err();
    assert!(matches!(err, CryptoError::Decrypt(_)));
}

#[test]
fn open_malformed_base64_is_ciphertext_error() {
    let err = open::<Value>(shared_key(), "%%% not base64 %%%").unwrap_err();
    assert!(matches!(err, CryptoError::Ciphertext(_)));
}

#[test]
fn open_truncated_ciphertext_is_decrypt_error() {
    let key = shared_key();
    let sealed = seal(key.public(), &json!(true)).unwrap();
    let bytes = STANDARD.decode(&sealed).unwrap();
    let truncated = STANDARD.encode(&bytes[..bytes.len() / 2]);
    assert!(matches!(open::<Value>(key, &truncated).unwrap_err(), CryptoError::Decrypt(_)));
}

#[test]
fn open_non_json_plaintext_is_payload_error() {
    let key = shared_key();
    let sealed = seal_bytes(key.public(), b"not json at all").unwrap();
    assert!(matches!(open::<Value>(key, &sealed).unwrap_err(), CryptoError::Payload(_)));
}

#[test]
fn open_non_utf8_plaintext_is_utf8_error() {
    let key = shared_key();
    let sealed = seal_bytes(key.public(), &[0xff, 0xfe, 0xfd]).unwrap();
    assert!(matches!(open_text(key, &sealed).unwrap_err(), CryptoError::Utf8(_)));
}

#[test]
fn seal_oversized_payload_is_encrypt_error() {
    let big = "x".repeat(200);
    let err = seal(shared_key().public(), &big).unwrap_err();
    assert!(matches!(err, CryptoError::Encrypt(_)));
}
