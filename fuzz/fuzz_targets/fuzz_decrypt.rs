#![no_main]

use std::sync::OnceLock;

use keysmith::KeyPair;
use libfuzzer_sys::fuzz_target;

fn key_pair() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| KeyPair::generate(Some("fuzz"), 1024).unwrap())
}

fuzz_target!(|data: &[u8]| {
    let key_pair = key_pair();

    if let Err(err) = key_pair.decrypt(data) {
        assert_eq!(err.error_type(), "DecryptionError");
    }

    // Anything within the payload limit must survive a round trip
    if data.len() <= key_pair.max_plaintext_len() {
        let ciphertext = key_pair.encrypt(data).unwrap();
        assert_eq!(key_pair.decrypt(&ciphertext).unwrap(), data);
    } else {
        assert!(key_pair.encrypt(data).is_err());
    }
});
