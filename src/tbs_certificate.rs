use der::asn1::{GeneralizedTime, OctetString, UtcTime};
use der::{AnyRef, DateTime};
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::time::Time;

use crate::cert::params::ExtensionParam;
use crate::error::Result;

/// First year that must be encoded as GeneralizedTime (RFC 5280 4.1.2.5).
const GENERALIZED_TIME_YEAR: u16 = 2050;

/// `sha256WithRSAEncryption` with the NULL parameters RFC 4055 requires.
pub fn sha256_with_rsa() -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
        parameters: Some(AnyRef::NULL.into()),
    }
}

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
///
/// # Fields
/// * `serial_number` - Serial allocated by the issuer.
/// * `signature_algorithm` - The algorithm used to sign the certificate.
/// * `issuer` - The distinguished name of the certificate issuer.
/// * `not_before` - The start of the certificate's validity period.
/// * `not_after` - The end of the certificate's validity period.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - Additional X.509 extensions for the certificate.
pub struct TbsCertificate {
    pub serial_number: u64,
    pub signature_algorithm: AlgorithmIdentifierOwned,
    pub issuer: Name,
    pub not_before: time::OffsetDateTime,
    pub not_after: time::OffsetDateTime,
    pub subject: Name,
    pub subject_public_key: SubjectPublicKeyInfoOwned,
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let extensions = self
            .extensions
            .iter()
            .map(|ext| {
                Ok(x509_cert::ext::Extension {
                    extn_id: ext.oid,
                    critical: ext.critical,
                    extn_value: OctetString::new(ext.value.clone())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let validity = x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        };

        // Uint encoding drops the leading zeroes and keeps the value positive.
        let serial_number = SerialNumber::new(&self.serial_number.to_be_bytes())?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: self.signature_algorithm.clone(),
            issuer: self.issuer.clone(),
            validity,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: Some(extensions),
        })
    }
}

/// Encodes a timestamp as UTCTime before 2050 and GeneralizedTime after.
fn to_x509_time(at: time::OffsetDateTime) -> Result<Time> {
    let date_time = DateTime::from_system_time(at.into())?;
    if date_time.year() < GENERALIZED_TIME_YEAR {
        Ok(Time::UtcTime(UtcTime::from_date_time(date_time)?))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_date_time(date_time)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    // 2050-01-01T00:00:00Z
    const YEAR_2050: i64 = 2_524_608_000;

    #[test]
    fn test_time_encoding_switches_at_2050() {
        let last_utc = OffsetDateTime::from_unix_timestamp(YEAR_2050 - 1).unwrap();
        let first_generalized = OffsetDateTime::from_unix_timestamp(YEAR_2050).unwrap();
        assert!(matches!(to_x509_time(last_utc).unwrap(), Time::UtcTime(_)));
        assert!(matches!(
            to_x509_time(first_generalized).unwrap(),
            Time::GeneralTime(_)
        ));
    }
}
