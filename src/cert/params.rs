use bon::Builder;
use const_oid::ObjectIdentifier;
use const_oid::db::rfc4519;
use der::asn1::{PrintableStringRef, SetOfVec};
use der::{Any, Tag, Tagged};
use time::{Duration, OffsetDateTime};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use super::extensions::ToAndFromX509Extension;
use crate::error::{CertyError, Result};

/// Parameters for creating a certificate in the store.
///
/// # Fields
/// * `common_name` - The common name (CN) of the new certificate.
/// * `organization` - The organization (O) of the new certificate.
/// * `country` - An optional country (C), two letters.
/// * `validity` - A compact duration such as `"30d"` or `"10y"`.
#[derive(Clone, Debug, Builder)]
pub struct CreateParams {
    #[builder(into)]
    pub common_name: String,
    #[builder(into)]
    pub organization: String,
    #[builder(into)]
    pub country: Option<String>,
    #[builder(into)]
    pub validity: String,
}

impl CreateParams {
    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName {
            common_name: self.common_name.clone(),
            organization: Some(self.organization.clone()).filter(|o| !o.is_empty()),
            country: self.country.clone().filter(|c| !c.is_empty()),
        }
    }
}

/// Distinguished name parameters for building an X.509 certificate.
///
/// Only the attributes the store writes are modelled; empty attributes are
/// left out of the encoded name entirely.
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub common_name: String,
    pub organization: Option<String>,
    pub country: Option<String>,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509 `Name`, ordered C, O, CN.
    pub fn as_x509_name(&self) -> Result<Name> {
        let mut rdns = Vec::new();
        if let Some(country) = &self.country {
            PrintableStringRef::new(country)
                .map_err(|_| CertyError::EncodingError(format!("invalid country {country:?}")))?;
            rdns.push(single_attribute(
                rfc4519::C,
                Any::new(Tag::PrintableString, country.as_bytes())?,
            )?);
        }
        if let Some(organization) = &self.organization {
            rdns.push(single_attribute(
                rfc4519::O,
                Any::new(Tag::Utf8String, organization.as_bytes())?,
            )?);
        }
        rdns.push(single_attribute(
            rfc4519::CN,
            Any::new(Tag::Utf8String, self.common_name.as_bytes())?,
        )?);
        Ok(RdnSequence(rdns))
    }

    /// Creates a `DistinguishedName` from an X.509 `Name`.
    ///
    /// Attributes that are missing or not a directory string are skipped.
    pub fn from_x509_name(name: &Name) -> Self {
        DistinguishedName {
            common_name: find_attribute(name, rfc4519::CN).unwrap_or_default(),
            organization: find_attribute(name, rfc4519::O),
            country: find_attribute(name, rfc4519::C),
        }
    }
}

fn single_attribute(oid: ObjectIdentifier, value: Any) -> Result<RelativeDistinguishedName> {
    let set = SetOfVec::try_from(vec![AttributeTypeAndValue { oid, value }])?;
    Ok(RelativeDistinguishedName(set))
}

fn find_attribute(name: &Name, oid: ObjectIdentifier) -> Option<String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find(|attr| attr.oid == oid)
        .and_then(|attr| directory_string(&attr.value))
}

fn directory_string(value: &Any) -> Option<String> {
    match value.tag() {
        Tag::Utf8String | Tag::PrintableString | Tag::Ia5String => {
            std::str::from_utf8(value.value()).ok().map(str::to_string)
        }
        _ => None,
    }
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now and lasting `lifetime`.
    pub fn starting_now(lifetime: Duration) -> Result<Self> {
        Self::starting_at(OffsetDateTime::now_utc(), lifetime)
    }

    pub fn starting_at(not_before: OffsetDateTime, lifetime: Duration) -> Result<Self> {
        let not_after = not_before
            .checked_add(lifetime)
            .ok_or_else(|| CertyError::InvalidNumber(format!("{lifetime} from {not_before}")))?;
        Ok(Self {
            not_before,
            not_after,
        })
    }
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinguished_name_round_trip() {
        let dn = DistinguishedName::builder()
            .common_name("Root CA".to_string())
            .organization("Crab widgits SE".to_string())
            .country("SE".to_string())
            .build();
        let name = dn.as_x509_name().unwrap();
        assert_eq!(name.0.len(), 3);
        assert_eq!(DistinguishedName::from_x509_name(&name), dn);
    }

    #[test]
    fn test_empty_organization_is_omitted() {
        let params = CreateParams::builder()
            .common_name("Leaf")
            .organization("")
            .validity("30d")
            .build();
        let name = params.subject().as_x509_name().unwrap();
        assert_eq!(name.0.len(), 1);
    }

    #[test]
    fn test_country_must_be_printable() {
        let dn = DistinguishedName {
            common_name: "x".to_string(),
            organization: None,
            country: Some("S@".to_string()),
        };
        assert!(matches!(
            dn.as_x509_name(),
            Err(CertyError::EncodingError(_))
        ));
    }

    #[test]
    fn test_validity_overflow() {
        assert!(matches!(
            Validity::starting_now(Duration::MAX),
            Err(CertyError::InvalidNumber(_))
        ));
    }
}
