#![no_main]

use arbitrary::Arbitrary;
use keysmith::KeyPair;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct RawMaterialFuzzInput {
    private_key: Vec<u8>,
    public_key: Vec<u8>,
    key_size: u8,
    signature: Vec<u8>,
    message: Vec<u8>,
}

fuzz_target!(|input: RawMaterialFuzzInput| {
    let bits = match input.key_size % 4 {
        0 => 1024,
        1 => 2048,
        2 => 3072,
        _ => 4096,
    };

    // Arbitrary bytes must be rejected cleanly, never panic
    if let Ok(key_pair) =
        KeyPair::from_raw_material(None, &input.private_key, &input.public_key, bits)
    {
        let _ = key_pair.sign(&input.message);
        let _ = key_pair.verify(&input.signature, &input.message);
    }

    let _ = KeyPair::verify_with_public_key(&input.public_key, &input.signature, &input.message);
});
