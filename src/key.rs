use std::path::Path;

use der::Encode;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::{CertyError, Result};
use crate::fs_util;
use crate::pem_utils::{self, PRIVATE_KEY, PUBLIC_KEY};

/// Default RSA modulus size for newly generated keys.
pub const DEFAULT_RSA_BITS: usize = 2048;

/// An RSA key pair belonging to one certificate in the store.
#[derive(Clone)]
pub struct KeyPair {
    private: Box<RsaPrivateKey>,
    public: RsaPublicKey,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)?;
        Ok(Self::from_private_key(private))
    }

    pub fn from_private_key(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        KeyPair {
            private: Box::new(private),
            public,
        }
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    /// Import a key from PKCS#8 DER, rejecting anything that is not RSA.
    pub fn import_from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = pkcs8::PrivateKeyInfo::try_from(der)?;
        if info.algorithm.oid != const_oid::db::rfc5912::RSA_ENCRYPTION {
            return Err(CertyError::NotAnRsaKey);
        }
        let private = RsaPrivateKey::from_pkcs8_der(der)?;
        Ok(Self::from_private_key(private))
    }

    /// Import a key from a PEM `PRIVATE KEY` block.
    pub fn import_from_pkcs8_pem(pem: &[u8]) -> Result<Self> {
        let der = pem_utils::pem_to_der(pem, PRIVATE_KEY).ok_or_else(|| {
            CertyError::MalformedKey("file is not a PKCS#8 private key".to_string())
        })?;
        Self::import_from_pkcs8_der(&der)
    }

    /// Read and import `key.pem` style files.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| CertyError::KeyUnreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::import_from_pkcs8_pem(&bytes)
    }

    /// Write the private key as a PKCS#8 PEM file readable only by the owner.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs_util::write_private(path, self.to_pkcs8_pem()?.as_bytes())
    }

    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let doc = self
            .private
            .to_pkcs8_der()
            .map_err(|e| CertyError::EncodingError(e.to_string()))?;
        Ok(doc.as_bytes().to_vec())
    }

    pub fn to_pkcs8_pem(&self) -> Result<String> {
        Ok(pem_utils::der_to_pem(&self.to_pkcs8_der()?, PRIVATE_KEY))
    }

    /// The public half as a SubjectPublicKeyInfo structure.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        Ok(SubjectPublicKeyInfoOwned::from_key(self.public.clone())?)
    }

    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        Ok(self.as_spki()?.to_der()?)
    }

    pub fn public_key_pem(&self) -> Result<String> {
        let doc = self.public.to_public_key_der()?;
        Ok(pem_utils::der_to_pem(doc.as_bytes(), PUBLIC_KEY))
    }
}
