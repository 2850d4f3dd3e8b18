mod util;

use std::process::Command;

use openssl::nid::Nid;
use openssl::x509::{X509, X509Ref};

fn common_name(name: &openssl::x509::X509NameRef) -> String {
    name.entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap()
        .to_string()
}

fn serial(cert: &X509Ref) -> String {
    cert.serial_number()
        .to_bn()
        .unwrap()
        .to_dec_str()
        .unwrap()
        .to_string()
}

#[test]
fn test_openssl_crate_validate_chain() {
    let dir = tempfile::tempdir().unwrap();
    let store = util::open_store(dir.path());
    let (_, _, leaf) = util::create_hierarchy(&store);

    let chain = store.export_chain_pem(&leaf).unwrap();
    let certs = X509::stack_from_pem(&chain.bytes).expect("Failed to parse chain");
    assert_eq!(certs.len(), 3);
    let (root, intermediate, leaf) = (&certs[0], &certs[1], &certs[2]);

    assert_eq!(common_name(root.subject_name()), "Root CA");
    assert_eq!(common_name(root.issuer_name()), "Root CA");
    assert_eq!(common_name(intermediate.subject_name()), "Intermediate CA");
    assert_eq!(common_name(intermediate.issuer_name()), "Root CA");
    assert_eq!(common_name(leaf.subject_name()), "client.myca.local");
    assert_eq!(common_name(leaf.issuer_name()), "Intermediate CA");

    // Version 3 is index 2.
    assert_eq!(leaf.version(), 2);
    assert_eq!(serial(root), "1");
    assert_eq!(serial(intermediate), "1");
    assert_eq!(serial(leaf), "1");

    assert_eq!(
        leaf.signature_algorithm().object().nid(),
        Nid::SHA256WITHRSAENCRYPTION
    );

    // Each certificate is signed by the key of the one above it.
    assert!(root.verify(&root.public_key().unwrap()).unwrap());
    assert!(intermediate.verify(&root.public_key().unwrap()).unwrap());
    assert!(leaf.verify(&intermediate.public_key().unwrap()).unwrap());
    assert!(!leaf.verify(&root.public_key().unwrap()).unwrap());

    let lifetime = leaf.not_before().diff(leaf.not_after()).unwrap();
    assert_eq!(lifetime.days, 30);
    assert_eq!(lifetime.secs, 0);
}

#[test]
fn test_openssl_crate_reads_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = util::open_store(dir.path());
    let root = store.create("", &util::params("Root CA", "1y")).unwrap();

    let cert = X509::from_pem(&store.export_certificate_pem(&root).unwrap().bytes).unwrap();
    let private = openssl::pkey::PKey::private_key_from_pem(
        &store.export_private_key_pem(&root).unwrap().bytes,
    )
    .expect("Failed to parse private key");
    let public = openssl::pkey::PKey::public_key_from_pem(
        &store.export_public_key_pem(&root).unwrap().bytes,
    )
    .expect("Failed to parse public key");

    assert_eq!(private.bits(), util::TEST_KEY_BITS as u32);
    assert!(cert.public_key().unwrap().public_eq(&public));
    assert!(private.public_eq(&public));
}

#[test]
fn test_openssl_cli_prints_cert() {
    let dir = tempfile::tempdir().unwrap();
    let store = util::open_store(dir.path());
    let root = store.create("", &util::params("Root CA", "10y")).unwrap();
    let leaf = store
        .create(&root, &util::params("server.myca.local", "90d"))
        .unwrap();
    let cert_path = store.resolve(&leaf).unwrap().dir.join(certy::tree::CERT_FILE);

    let output = Command::new("openssl")
        .arg("x509")
        .arg("-in")
        .arg(&cert_path)
        .arg("-noout")
        .arg("-text")
        .output()
        .expect("Failed to execute OpenSSL command");
    assert!(
        output.status.success(),
        "OpenSSL command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output_text = String::from_utf8_lossy(&output.stdout);
    let normalized = output_text.replace(" = ", "=");
    assert!(normalized.contains("CN=server.myca.local"), "Subject field is incorrect");
    assert!(normalized.contains("CN=Root CA"), "Issuer field is incorrect");
    assert!(output_text.contains("Version: 3 (0x2)"));
    assert!(output_text.contains("Serial Number: 1 (0x1)"));
    assert!(output_text.contains("sha256WithRSAEncryption"));
    assert!(output_text.contains("TLS Web Client Authentication"));
}

#[test]
fn test_openssl_crate_reads_pkcs12() {
    let dir = tempfile::tempdir().unwrap();
    let store = util::open_store(dir.path());
    let (_, _, leaf) = util::create_hierarchy(&store);
    let export = store.export_pkcs12(&leaf, "hunter2").unwrap();

    let pkcs12 = openssl::pkcs12::Pkcs12::from_der(&export.bytes).expect("Failed to parse PKCS#12");
    assert!(pkcs12.parse2("wrong").is_err());
    let parsed = pkcs12.parse2("hunter2").expect("Failed to decrypt PKCS#12");

    let cert = parsed.cert.unwrap();
    assert_eq!(common_name(cert.subject_name()), "client.myca.local");
    assert!(cert.public_key().unwrap().public_eq(&parsed.pkey.unwrap()));

    let mut ca_names: Vec<String> = parsed
        .ca
        .unwrap()
        .iter()
        .map(|ca| common_name(ca.subject_name()))
        .collect();
    ca_names.sort();
    assert_eq!(ca_names, vec!["Intermediate CA", "Root CA"]);
}

#[test]
fn test_openssl_cli_reads_pkcs12() {
    let dir = tempfile::tempdir().unwrap();
    let store = util::open_store(dir.path());
    let root = store.create("", &util::params("Root CA", "1y")).unwrap();
    let leaf = store
        .create(&root, &util::params("client.myca.local", "30d"))
        .unwrap();
    let bundle_path = dir.path().join("bundle.p12");
    std::fs::write(&bundle_path, store.export_pkcs12(&leaf, "hunter2").unwrap().bytes).unwrap();

    let output = Command::new("openssl")
        .arg("pkcs12")
        .arg("-in")
        .arg(&bundle_path)
        .arg("-passin")
        .arg("pass:hunter2")
        .arg("-nodes")
        .arg("-info")
        .output()
        .expect("Failed to execute OpenSSL command");
    assert!(
        output.status.success(),
        "OpenSSL command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let info = String::from_utf8_lossy(&output.stderr);
    assert!(info.contains("PBES2"), "unexpected encryption: {info}");
    assert!(!info.contains("RC2"), "unexpected encryption: {info}");
    let output_text = String::from_utf8_lossy(&output.stdout);
    assert!(output_text.contains("BEGIN PRIVATE KEY"));
    assert_eq!(output_text.matches("BEGIN CERTIFICATE").count(), 2);
}
