/*!
 * RSA key pair lifecycle and operations
 *
 * Generation, storage round-trips, PKCS#1 v1.5 encryption and SHA-256
 * signatures over a single local identity.
 */

mod keypair;

pub use keypair::KeyPair;
