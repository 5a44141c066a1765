#![no_main]

use std::sync::OnceLock;

use arbitrary::Arbitrary;
use keysmith::KeyPair;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct SignatureFuzzInput {
    message: Vec<u8>,
    signature: Vec<u8>,
    flip: u16,
}

fn key_pair() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| KeyPair::generate(Some("fuzz"), 1024).unwrap())
}

fuzz_target!(|input: SignatureFuzzInput| {
    let key_pair = key_pair();

    // Fuzzed signatures must never panic and never verify as an error unless malformed
    match key_pair.verify(&input.signature, &input.message) {
        Ok(_) => assert_eq!(input.signature.len(), 128),
        Err(err) => assert_eq!(err.error_type(), "VerificationError"),
    }

    // A genuine signature with one bit flipped must be rejected
    if let Ok(mut signature) = key_pair.sign(&input.message) {
        assert!(key_pair.verify(&signature, &input.message).unwrap());

        let bit = input.flip as usize % (signature.len() * 8);
        signature[bit / 8] ^= 1 << (bit % 8);
        assert!(!key_pair.verify(&signature, &input.message).unwrap());
    }
});
