// Test vectors for interoperability with other PKCS#1 implementations

pub mod rsa_pkcs1;
