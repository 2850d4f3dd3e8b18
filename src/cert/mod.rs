pub mod extensions;
pub mod params;

use der::{Decode, Encode};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;

use crate::error::Result;
use crate::pem_utils::{self, CERTIFICATE};
use extensions::{
    BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption, KeyUsage, ToAndFromX509Extension,
};
use params::DistinguishedName;

/// Number of hex characters of the fingerprint used as a node id.
pub const ID_LEN: usize = 12;

/// Represents an X.509 certificate together with the exact DER it was read from.
///
/// Identity (`id` and `fingerprint`) is always derived from these bytes, so
/// a certificate re-read from disk has the same identity as the one written.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
    der: Vec<u8>,
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl Certificate {
    /// Parses a DER-encoded certificate.
    pub fn from_der(der: Vec<u8>) -> std::result::Result<Self, der::Error> {
        let inner = CertificateInner::from_der(&der)?;
        Ok(Self { inner, der })
    }

    /// Wraps a freshly signed certificate, encoding it to DER.
    pub fn from_inner(inner: CertificateInner) -> Result<Self> {
        let der = inner.to_der()?;
        Ok(Self { inner, der })
    }

    /// The DER encoding of the certificate.
    pub fn to_der(&self) -> &[u8] {
        &self.der
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> String {
        pem_utils::der_to_pem(&self.der, CERTIFICATE)
    }

    /// Full lowercase hex SHA-256 of the DER encoding.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(&self.der))
    }

    /// Short identifier: the first [`ID_LEN`] hex characters of the fingerprint.
    pub fn id(&self) -> String {
        let digest = Sha256::digest(&self.der);
        hex::encode(&digest[..ID_LEN / 2])
    }

    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.subject)
    }

    pub fn issuer(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.issuer)
    }

    pub fn not_before(&self) -> OffsetDateTime {
        self.inner
            .tbs_certificate
            .validity
            .not_before
            .to_system_time()
            .into()
    }

    pub fn not_after(&self) -> OffsetDateTime {
        self.inner
            .tbs_certificate
            .validity
            .not_after
            .to_system_time()
            .into()
    }

    /// Serial number as lowercase hex without leading zero bytes.
    pub fn serial_hex(&self) -> String {
        hex::encode(self.serial_bytes())
    }

    /// Serial number as an integer, if it fits in 64 bits.
    pub fn serial_u64(&self) -> Option<u64> {
        let bytes = self.serial_bytes();
        if bytes.len() > 8 {
            return None;
        }
        Some(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    fn serial_bytes(&self) -> &[u8] {
        let bytes = self.inner.tbs_certificate.serial_number.as_bytes();
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        &bytes[start..]
    }

    /// Decodes extension `E`, if present and well formed.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Option<E> {
        self.inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .find(|ext| ext.extn_id == E::OID)
            .and_then(|ext| E::from_x509_extension_value(ext.extn_value.as_bytes()).ok())
    }

    /// Whether the basic constraints extension marks this certificate as a CA.
    pub fn is_ca(&self) -> bool {
        self.extension::<BasicConstraints>()
            .is_some_and(|bc| bc.is_ca)
    }

    /// Extracts the fields shown when listing or viewing certificates.
    pub fn summary(&self) -> CertificateSummary {
        CertificateSummary {
            subject: self.subject(),
            issuer: self.issuer(),
            serial: self.serial_hex(),
            not_before: self.not_before(),
            not_after: self.not_after(),
            is_ca: self.is_ca(),
            key_usage: self
                .extension::<KeyUsage>()
                .map(|ku| ku.names())
                .unwrap_or_default(),
            extended_key_usage: self
                .extension::<ExtendedKeyUsage>()
                .map(|eku| eku.usage)
                .unwrap_or_default(),
        }
    }
}

/// Display oriented view of a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    pub subject: DistinguishedName,
    pub issuer: DistinguishedName,
    pub serial: String,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    pub is_ca: bool,
    /// Names of the key usage bits, empty when the extension is absent.
    pub key_usage: Vec<&'static str>,
    pub extended_key_usage: Vec<ExtendedKeyUsageOption>,
}
