use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use x509_cert::certificate::CertificateInner;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::Certificate;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption, KeyUsage,
    SubjectKeyIdentifier,
};
use crate::cert::params::{DistinguishedName, ExtensionParam, Validity};
use crate::error::{CertyError, Result};
use crate::tbs_certificate::{self, TbsCertificate};

/// Everything about a new certificate that is chosen before signing.
#[derive(Clone, Debug)]
pub struct CertificateTemplate {
    pub subject: DistinguishedName,
    pub serial_number: u64,
    pub validity: Validity,
    pub is_ca: bool,
}

/// Signs certificate templates.
///
/// The store calls this once per created node. `issuer` is `None` for a
/// self-signed root, in which case `signing_key` is the private half of
/// `subject_key`.
pub trait CertificateSigner: Send + Sync {
    fn sign(
        &self,
        template: &CertificateTemplate,
        issuer: Option<&Certificate>,
        subject_key: &RsaPublicKey,
        signing_key: &RsaPrivateKey,
    ) -> Result<Certificate>;
}

/// Signs with RSASSA-PKCS1-v1_5 over SHA-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaSha256Signer;

impl CertificateSigner for RsaSha256Signer {
    fn sign(
        &self,
        template: &CertificateTemplate,
        issuer: Option<&Certificate>,
        subject_key: &RsaPublicKey,
        signing_key: &RsaPrivateKey,
    ) -> Result<Certificate> {
        let subject_public_key = SubjectPublicKeyInfoOwned::from_key(subject_key.clone())?;
        let subject = template.subject.as_x509_name()?;

        // A root is its own issuer.
        let (issuer_name, authority_key_id) = match issuer {
            Some(issuer) => {
                let tbs = &issuer.inner.tbs_certificate;
                (
                    tbs.subject.clone(),
                    AuthorityKeyIdentifier::of(&tbs.subject_public_key_info),
                )
            }
            None => (
                subject.clone(),
                AuthorityKeyIdentifier::of(&subject_public_key),
            ),
        };

        let basic_constraints = if template.is_ca {
            BasicConstraints::ca()
        } else {
            BasicConstraints::end_entity()
        };
        let extensions = vec![
            ExtensionParam::from_extension(basic_constraints, true)?,
            ExtensionParam::from_extension(KeyUsage::for_node(template.is_ca), true)?,
            ExtensionParam::from_extension(
                ExtendedKeyUsage {
                    usage: vec![ExtendedKeyUsageOption::ClientAuth],
                },
                false,
            )?,
            ExtensionParam::from_extension(SubjectKeyIdentifier::of(&subject_public_key), false)?,
            ExtensionParam::from_extension(authority_key_id, false)?,
        ];

        let signature_algorithm = tbs_certificate::sha256_with_rsa();
        let tbs_cert = TbsCertificate {
            serial_number: template.serial_number,
            signature_algorithm: signature_algorithm.clone(),
            issuer: issuer_name,
            not_before: template.validity.not_before,
            not_after: template.validity.not_after,
            subject,
            subject_public_key,
            extensions,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
        let tbs_der = der::Encode::to_der(&tbs_cert_inner)?;

        let signer = SigningKey::<Sha256>::new(signing_key.clone());
        let signature = signer
            .try_sign(&tbs_der)
            .map_err(|e| CertyError::SigningError(e.to_string()))?;

        Certificate::from_inner(CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm,
            signature: der::asn1::BitString::from_bytes(&signature.to_bytes())?,
        })
    }
}
