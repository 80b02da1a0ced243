//! Tests for the stored-API-key envelope (AES-256-CBC, hex, scrypt key).

use clary_crypto::{
    CryptoError, KdfParams, SERVER_KEY_SALT, ServerCodec, ServerKey, StoredSecretEnvelope,
};
use pretty_assertions::assert_eq;

fn codec(secret: &str) -> ServerCodec {
    ServerCodec::from_secret(secret, &KdfParams::insecure_fast()).unwrap()
}

// ── Known answer ──

/// Envelope written by the deployed backend (Node `crypto`, scrypt N=2^14
/// r=8 p=1, `aes-256-cbc`) under the fallback secret with IV 00..0f.
const DEPLOYED_ENVELOPE: &str = "000102030405060708090a0b0c0d0e0f:\
    bbf7ad92034b572e5792bca596283045110f2b97d0c76cb736c3424e2bed3980";

#[test]
fn decrypts_envelope_written_by_deployed_backend() {
    let codec = ServerCodec::from_secret("fallback_secret", &KdfParams::default()).unwrap();
    let env = StoredSecretEnvelope::from_stored(DEPLOYED_ENVELOPE);
    assert_eq!(codec.decrypt(&env).unwrap().as_str(), "gk_abc123def456ghi789jkl012");
}

// ── Round trip ──

#[test]
fn saved_api_key_scenario() {
    let codec = codec("production-like-secret");
    let api_key = "gk_abc123def456ghi789jkl012";

    let env = codec.encrypt(api_key).unwrap();
    let (iv_hex, ct_hex) = env.as_str().split_once(':').unwrap();

    assert_eq!(iv_hex.len(), 32, "IV must be 16 bytes as hex");
    assert!(iv_hex.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(!ct_hex.is_empty());
    assert_eq!(ct_hex.len() % 32, 0, "ciphertext is whole AES blocks");

    assert_eq!(codec.decrypt(&env).unwrap().as_str(), api_key);
}

#[test]
fn roundtrip_with_default_params() {
    let codec = ServerCodec::from_secret("slow-path", &KdfParams::default()).unwrap();
    let env = codec.encrypt("gk_default_params_key").unwrap();
    assert_eq!(codec.decrypt(&env).unwrap().as_str(), "gk_default_params_key");
}

#[test]
fn roundtrip_unicode() {
    let codec = codec("s");
    let text = "ключ-🔑-鍵-clé";
    let env = codec.encrypt(text).unwrap();
    assert_eq!(codec.decrypt(&env).unwrap().as_str(), text);
}

#[test]
fn roundtrip_8000_bytes() {
    let codec = codec("s");
    let text = "x".repeat(8000);
    let env = codec.encrypt(&text).unwrap();
    assert_eq!(codec.decrypt(&env).unwrap().as_str(), text);
}

// ── Nonce uniqueness ──

#[test]
fn same_plaintext_twice_gives_different_envelopes() {
    let codec = codec("s");
    let a = codec.encrypt("gk_same_key_every_time").unwrap();
    let b = codec.encrypt("gk_same_key_every_time").unwrap();

    assert_ne!(a, b);
    let iv_a = a.as_str().split_once(':').unwrap().0;
    let iv_b = b.as_str().split_once(':').unwrap().0;
    assert_ne!(iv_a, iv_b);

    assert_eq!(codec.decrypt(&a).unwrap().as_str(), "gk_same_key_every_time");
    assert_eq!(codec.decrypt(&b).unwrap().as_str(), "gk_same_key_every_time");
}

// ── Key derivation ──

#[test]
fn restart_with_same_secret_reads_old_envelopes() {
    let before_restart = codec("stable-secret");
    let env = before_restart.encrypt("gk_survives_restart").unwrap();
    drop(before_restart);

    let after_restart = codec("stable-secret");
    assert_eq!(
        after_restart.decrypt(&env).unwrap().as_str(),
        "gk_survives_restart"
    );
}

#[test]
fn derive_key_twice_is_identical() {
    let params = KdfParams::insecure_fast();
    let a = ServerKey::derive("secret", SERVER_KEY_SALT, &params).unwrap();
    let b = ServerKey::derive("secret", SERVER_KEY_SALT, &params).unwrap();
    assert_eq!(a.as_bytes(), b.as_bytes());

    let codec_a = ServerCodec::new(a);
    let codec_b = ServerCodec::new(b);
    let env = codec_a.encrypt("cross").unwrap();
    assert_eq!(codec_b.decrypt(&env).unwrap().as_str(), "cross");
}

#[test]
fn changed_secret_never_returns_original() {
    let env = codec("old-secret").encrypt("gk_rotated_out_0123456789").unwrap();
    match codec("new-secret").decrypt(&env) {
        Err(CryptoError::Decryption(_)) => {}
        Ok(text) => assert_ne!(text.as_str(), "gk_rotated_out_0123456789"),
        Err(other) => panic!("unexpected error kind: {other:?}"),
    }
}

// ── Malformed input ──

#[test]
fn not_a_valid_envelope_is_decryption_error() {
    let err = codec("s")
        .decrypt(&StoredSecretEnvelope::from_stored("not-a-valid-envelope"))
        .unwrap_err();
    assert!(matches!(err, CryptoError::Decryption(_)));
    assert!(err.requires_reentry());
}

#[test]
fn malformed_envelopes_fail_without_panicking() {
    let codec = codec("s");
    let valid = codec.encrypt("gk_valid").unwrap();
    let (iv, ct) = valid.as_str().split_once(':').unwrap();

    let cases = [
        String::new(),
        ":".to_string(),
        format!("{iv}:"),
        format!(":{ct}"),
        format!("{iv}{ct}"),
        format!("zz{}:{ct}", &iv[2..]),
        format!("{iv}:{}zz", &ct[..ct.len() - 2]),
        format!("{}:{ct}", &iv[..30]),
        format!("{iv}00:{ct}"),
        format!("{iv}:{}", &ct[..ct.len() - 2]),
        format!("{iv}:{ct}:extra"),
    ];

    for case in cases {
        let result = codec.decrypt(&StoredSecretEnvelope::from_stored(case.clone()));
        assert!(
            matches!(result, Err(CryptoError::Decryption(_))),
            "expected decryption error for {case:?}"
        );
    }
}

#[test]
fn uppercase_hex_is_accepted() {
    let codec = codec("s");
    let env = codec.encrypt("gk_upper").unwrap();
    let upper = StoredSecretEnvelope::from_stored(env.as_str().to_uppercase());
    assert_eq!(codec.decrypt(&upper).unwrap().as_str(), "gk_upper");
}

// ── Malleability (no integrity check) ──

#[test]
fn flipped_iv_bit_silently_changes_first_byte() {
    let codec = codec("s");
    let env = codec.encrypt("gk_abc123def456ghi789").unwrap();
    let (iv_hex, ct_hex) = env.as_str().split_once(':').unwrap();

    let mut iv = hex::decode(iv_hex).unwrap();
    iv[0] ^= 0x01;
    let tampered = StoredSecretEnvelope::from_stored(format!("{}:{ct_hex}", hex::encode(iv)));

    // 'g' ^ 0x01 == 'f'
    assert_eq!(codec.decrypt(&tampered).unwrap().as_str(), "fk_abc123def456ghi789");
}
