// RSA PKCS#1 v1.5 interoperability vectors
// Produced with an independent PKCS#1 implementation (OpenSSL backend) so the
// DigestInfo layout and padding are checked against a reference.

/// 1024-bit key, PKCS#1 DER RSAPrivateKey
pub const PRIVATE_KEY_DER: &str = concat!(
    "3082025c02010002818100ad024eb70a63bf1d4bc1c24b18ecd1985cf04c2736",
    "58498eb32dd5e3f2dbbaa4a7e8a08dd15226462ff00b48fa0c07780dfa5b4c82",
    "f07788bb788b19334ef3fb3e65a380a7444ac68527eedc347b4b1169255f92d5",
    "bec15c9d685083ca14772767a249d1bc03b76ee8843b97eda67dffc271c66e1d",
    "8745923059420f5a74d0890203010001028180529aa670b8b2355ecc7bffc391",
    "6c090ae15d0e4f2ea06ac68a8098fe54475b4f20a86e7827f83c3408d168e1f8",
    "19643b8b18fd1c83ec4276736433addd9495e297c7e49ba2b013c8fc0723d7a7",
    "373dffe318a40b905fa495a9e78065c85c68870d9a2501a281efc143b8e9e3c0",
    "884a9161d92e263ab5ecd3ce9df5a55e6c89b1024100d44323ef4a5bef5a51f5",
    "46b825a9e87deb795827414046e259578ce334f3eb17f71f64df4a0f0ef62063",
    "50c88dbbe6ce72615f21d92801b316166ef0d3d3d05d024100d0a88da8ea13e6",
    "f209f2690e8a69c47f24b02f14d28e31ea5a78fdb4298abb90ad8abc34c64edc",
    "d273e48f1be616ba4afd86e05e7eff7115573ad02591c3ae1d024019bdfac1ae",
    "76efd4385452bb4a760ca818c2a29a4023977523f8a63177de8d085f0403abc0",
    "c38ac0f6b494bb7dd4e7ece99a3d7b5166b4ae0f63b118abd7e851024100bd16",
    "61f996d69e4cecd2ae7dacd5186a97d6c973b73380ec7d3c73bcd680906515bf",
    "49bb1192d9ee2574147415d8b6cdca5e75e96c71140b60d73d552e7903c90240",
    "2df86147b6987ce0f338e13c1e67b5c9f13f7189068fcad663c37690bf8fa404",
    "12de462b445f41a1fdfcc838ba05622ed0449ffc488822a1d18894fe29602598",
);

/// Public half, PKCS#1 DER RSAPublicKey
pub const PUBLIC_KEY_DER: &str = concat!(
    "30818902818100ad024eb70a63bf1d4bc1c24b18ecd1985cf04c273658498eb3",
    "2dd5e3f2dbbaa4a7e8a08dd15226462ff00b48fa0c07780dfa5b4c82f07788bb",
    "788b19334ef3fb3e65a380a7444ac68527eedc347b4b1169255f92d5bec15c9d",
    "685083ca14772767a249d1bc03b76ee8843b97eda67dffc271c66e1d87459230",
    "59420f5a74d0890203010001",
);

/// SHA-256 PKCS#1 v1.5 signature over [0x01, 0x02, 0x03]
pub const SIGNATURE_010203: &str = concat!(
    "9ccaa9441862463d8e6af62adac5671f58b4d65448f519f3b4d08bf4279c08d0",
    "7d8c862c254d57a45d045e0bf94ceeaeb4734b4556324b04c4784aaebd9e6fd7",
    "9b921705a8bd442a854f5d3a881932cc346976725e99d24a2c2c0347fedfd77f",
    "f0dbe48420ae1a4b9d95b0a1416bd58b1496329d8911225c740ac125189de576",
);

/// SHA-256 PKCS#1 v1.5 signature over "hello"
pub const SIGNATURE_HELLO: &str = concat!(
    "312055fea521302f143d9041bf5a98b296f442b7044ac367d28bee67fe88aeeb",
    "883691549d78056fc42ddd86ca0a12af0e5a5ee1e4ebb4b8e75ee68391913850",
    "7e5791c143ecede372446ce9156f38b474e150500429e85d01c615c66421f8da",
    "b20d9fd4139d216a783b89d9ce38e2e0be43ea21e469a2469cd085eebafe68aa",
);

/// PKCS#1 v1.5 encryption of "hello"
pub const CIPHERTEXT_HELLO: &str = concat!(
    "7fd65bddc061a6721a4f3530f7e41cced081aeb3cbc14a033197b522a5c80c92",
    "1e1fc6000f31aa292025ba067785c777a19b53b1d394a6f98fb53b95fb5d65e0",
    "f6d7c6f167f714487825bbd864db618dff19af9f70114c13820e554dc202891f",
    "35b0202b022fbe911c79affef08424e65c3325cc1c6ecc21840cfeb19c77035d",
);

pub const KEY_SIZE_IN_BITS: usize = 1024;

pub fn bytes(hex_str: &str) -> Vec<u8> {
    hex::decode(hex_str).expect("test vector is valid hex")
}
