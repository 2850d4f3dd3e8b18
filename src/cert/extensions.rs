//! The handful of X.509 v3 extensions the store writes and reads back.

use const_oid::AssociatedOid;
use const_oid::db::rfc5912;
use der::{Decode, Encode, asn1::OctetString, oid::ObjectIdentifier};
pub use der::flagset::FlagSet;
use sha1::{Digest, Sha1};
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::Result;

/// Trait for converting to and from X.509 extensions.
///
/// # Example
/// ```
/// use certy::cert::extensions::{BasicConstraints, ToAndFromX509Extension};
/// let encoded = BasicConstraints::ca().to_x509_extension_value().unwrap();
/// let decoded = BasicConstraints::from_x509_extension_value(&encoded).unwrap();
/// assert!(decoded.is_ca);
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self>
    where
        Self: Sized;
}

/// Basic constraints. Roots are CAs without a path length limit; every
/// other node is written as an end entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl BasicConstraints {
    pub fn ca() -> Self {
        BasicConstraints {
            is_ca: true,
            max_path_length: None,
        }
    }

    pub fn end_entity() -> Self {
        BasicConstraints::default()
    }
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        Ok(x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        }
        .to_der()?)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self> {
        let decoded = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)?;
        Ok(BasicConstraints {
            is_ca: decoded.ca,
            max_path_length: decoded.path_len_constraint,
        })
    }
}

/// Key usage bits, with the RFC 5280 names used when displaying them.
const KEY_USAGE_NAMES: [(KeyUsages, &str); 9] = [
    (KeyUsages::DigitalSignature, "digitalSignature"),
    (KeyUsages::NonRepudiation, "nonRepudiation"),
    (KeyUsages::KeyEncipherment, "keyEncipherment"),
    (KeyUsages::DataEncipherment, "dataEncipherment"),
    (KeyUsages::KeyAgreement, "keyAgreement"),
    (KeyUsages::KeyCertSign, "keyCertSign"),
    (KeyUsages::CRLSign, "cRLSign"),
    (KeyUsages::EncipherOnly, "encipherOnly"),
    (KeyUsages::DecipherOnly, "decipherOnly"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl KeyUsage {
    /// Key usage for a certificate created by the store.
    ///
    /// Roots may sign certificates and revocation lists.
    pub fn for_node(is_ca: bool) -> Self {
        let mut flags: FlagSet<KeyUsages> = KeyUsages::DigitalSignature.into();
        if is_ca {
            flags |= KeyUsages::KeyCertSign | KeyUsages::CRLSign;
        }
        KeyUsage(flags)
    }

    /// Names of the bits that are set, in bit order.
    pub fn names(&self) -> Vec<&'static str> {
        KEY_USAGE_NAMES
            .iter()
            .filter(|(flag, _)| self.0.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        Ok(X509KeyUsage::from(self.0).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        Ok(KeyUsage(X509KeyUsage::from_der(extension)?.0))
    }
}

/// An extended key usage purpose. Purposes the store does not know by name
/// are kept as their OID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendedKeyUsageOption {
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    Other(ObjectIdentifier),
}

const NAMED_PURPOSES: [ExtendedKeyUsageOption; 4] = [
    ExtendedKeyUsageOption::ServerAuth,
    ExtendedKeyUsageOption::ClientAuth,
    ExtendedKeyUsageOption::CodeSigning,
    ExtendedKeyUsageOption::EmailProtection,
];

impl From<ObjectIdentifier> for ExtendedKeyUsageOption {
    fn from(oid: ObjectIdentifier) -> Self {
        NAMED_PURPOSES
            .into_iter()
            .find(|option| ObjectIdentifier::from(*option) == oid)
            .unwrap_or(ExtendedKeyUsageOption::Other(oid))
    }
}

impl From<ExtendedKeyUsageOption> for ObjectIdentifier {
    fn from(value: ExtendedKeyUsageOption) -> Self {
        match value {
            ExtendedKeyUsageOption::ServerAuth => rfc5912::ID_KP_SERVER_AUTH,
            ExtendedKeyUsageOption::ClientAuth => rfc5912::ID_KP_CLIENT_AUTH,
            ExtendedKeyUsageOption::CodeSigning => rfc5912::ID_KP_CODE_SIGNING,
            ExtendedKeyUsageOption::EmailProtection => rfc5912::ID_KP_EMAIL_PROTECTION,
            ExtendedKeyUsageOption::Other(oid) => oid,
        }
    }
}

impl std::fmt::Display for ExtendedKeyUsageOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtendedKeyUsageOption::ServerAuth => f.write_str("serverAuth"),
            ExtendedKeyUsageOption::ClientAuth => f.write_str("clientAuth"),
            ExtendedKeyUsageOption::CodeSigning => f.write_str("codeSigning"),
            ExtendedKeyUsageOption::EmailProtection => f.write_str("emailProtection"),
            ExtendedKeyUsageOption::Other(oid) => write!(f, "{oid}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedKeyUsage {
    pub usage: Vec<ExtendedKeyUsageOption>,
}

impl ToAndFromX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::ExtendedKeyUsage::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let oids = self.usage.iter().copied().map(ObjectIdentifier::from).collect();
        Ok(x509_cert::ext::pkix::ExtendedKeyUsage(oids).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let decoded = x509_cert::ext::pkix::ExtendedKeyUsage::from_der(extension)?;
        Ok(ExtendedKeyUsage {
            usage: decoded.0.into_iter().map(ExtendedKeyUsageOption::from).collect(),
        })
    }
}

/// RFC 5280 section 4.2.1.2 method 1: SHA-1 of the subjectPublicKey bits.
fn key_identifier(spki: &SubjectPublicKeyInfoOwned) -> Vec<u8> {
    Sha1::digest(spki.subject_public_key.raw_bytes()).to_vec()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier(pub Vec<u8>);

impl SubjectKeyIdentifier {
    pub fn of(spki: &SubjectPublicKeyInfoOwned) -> Self {
        SubjectKeyIdentifier(key_identifier(spki))
    }
}

impl ToAndFromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let id = OctetString::new(self.0.as_slice())?;
        Ok(x509_cert::ext::pkix::SubjectKeyIdentifier(id).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let decoded = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension)?;
        Ok(SubjectKeyIdentifier(decoded.0.into_bytes()))
    }
}

/// Authority key identifier, written in its key identifier form only.
///
/// Always equal to the issuer's [`SubjectKeyIdentifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Vec<u8>,
}

impl AuthorityKeyIdentifier {
    pub fn of(issuer_spki: &SubjectPublicKeyInfoOwned) -> Self {
        AuthorityKeyIdentifier {
            key_identifier: key_identifier(issuer_spki),
        }
    }
}

impl ToAndFromX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::AuthorityKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        Ok(x509_cert::ext::pkix::AuthorityKeyIdentifier {
            key_identifier: Some(OctetString::new(self.key_identifier.as_slice())?),
            authority_cert_issuer: None,
            authority_cert_serial_number: None,
        }
        .to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let decoded = x509_cert::ext::pkix::AuthorityKeyIdentifier::from_der(extension)?;
        Ok(AuthorityKeyIdentifier {
            key_identifier: decoded
                .key_identifier
                .map(OctetString::into_bytes)
                .unwrap_or_default(),
        })
    }
}
