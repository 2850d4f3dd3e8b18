/// PEM label of an X.509 certificate.
pub const CERTIFICATE: &str = "CERTIFICATE";
/// PEM label of a PKCS#8 private key.
pub const PRIVATE_KEY: &str = "PRIVATE KEY";
/// PEM label of an SPKI public key.
pub const PUBLIC_KEY: &str = "PUBLIC KEY";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Decode the first PEM block of `input`, returning its DER contents only if
/// the block carries `label`.
pub fn pem_to_der(input: &[u8], label: &str) -> Option<Vec<u8>> {
    let pem = pem::parse(input).ok()?;
    (pem.tag() == label).then(|| pem.into_contents())
}
