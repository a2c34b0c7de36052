// End-to-end codec invariants spanning ascii85, rc4, and kdf together,
// matching the end-to-end scenarios in spec.md §8.

use splinter_core::{ascii85, kdf, Rc4};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[test]
fn encrypt_then_ascii85_round_trips_through_a_derived_key() -> Result<()> {
    let passphrase = "correct horse battery staple";
    let salt = vec![0x5Au8; kdf::SALT_LEN];
    let iv = vec![0xA5u8; 16];
    let key = kdf::derive_key(passphrase, &salt, kdf::KEY_LEN);

    let plaintext = b"the quick brown fox jumps over the lazy dog".to_vec();
    let mut ciphertext = plaintext.clone();
    Rc4::apply_keystream_static(&key, &iv, &mut ciphertext);

    let encoded = ascii85::encode(&ciphertext);
    let decoded = ascii85::decode(&encoded, false)?;
    assert_eq!(decoded, ciphertext);

    let mut recovered = decoded;
    Rc4::apply_keystream_static(&key, &iv, &mut recovered);
    assert_eq!(recovered, plaintext);
    Ok(())
}

#[test]
fn different_passphrases_derive_different_keys_and_ciphertexts() -> Result<()> {
    let salt = vec![0x11u8; kdf::SALT_LEN];
    let iv = vec![0x22u8; 16];
    let plaintext = b"same plaintext, different keys".to_vec();

    let key_a = kdf::derive_key("passphrase-a", &salt, kdf::KEY_LEN);
    let key_b = kdf::derive_key("passphrase-b", &salt, kdf::KEY_LEN);
    assert_ne!(key_a, key_b);

    let mut cipher_a = plaintext.clone();
    Rc4::apply_keystream_static(&key_a, &iv, &mut cipher_a);
    let mut cipher_b = plaintext;
    Rc4::apply_keystream_static(&key_b, &iv, &mut cipher_b);
    assert_ne!(cipher_a, cipher_b);
    Ok(())
}
