use p12_keystore::{EncryptionAlgorithm, KeyStore, KeyStoreEntry, MacAlgorithm, PrivateKeyChain};
use sha2::{Digest, Sha256};

use crate::error::{CertyError, Result};
use crate::key::KeyPair;
use crate::pem_utils::{self, PRIVATE_KEY};
use crate::tree::KEY_FILE;

use super::{Store, locate};

/// MIME type of every PEM export.
pub const PEM_CONTENT_TYPE: &str = "application/x-pem-file";

/// MIME type of PKCS#12 bundles.
pub const PKCS12_CONTENT_TYPE: &str = "application/x-pkcs12";

/// Exported bytes plus what a caller needs to serve them as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: String,
}

impl Export {
    fn pem(contents: String, file_name: String) -> Self {
        Export {
            bytes: contents.into_bytes(),
            content_type: PEM_CONTENT_TYPE,
            file_name,
        }
    }
}

impl Store {
    /// The certificate at `path` as a single PEM block.
    pub fn export_certificate_pem(&self, path: &str) -> Result<Export> {
        let tree = self.tree.read();
        let node = tree.node(locate(&tree, path)?);
        Ok(Export::pem(
            node.certificate().to_pem(),
            format!("{}.crt", node.id()),
        ))
    }

    /// The certificate at `path` and all of its ancestors, root first.
    pub fn export_chain_pem(&self, path: &str) -> Result<Export> {
        let tree = self.tree.read();
        let index = locate(&tree, path)?;
        let chain: String = tree
            .chain(index)
            .into_iter()
            .map(|i| tree.node(i).certificate().to_pem())
            .collect();
        Ok(Export::pem(
            chain,
            format!("{}-chain.crt", tree.node(index).id()),
        ))
    }

    /// The public half of the key at `path`, as an SPKI `PUBLIC KEY` block.
    pub fn export_public_key_pem(&self, path: &str) -> Result<Export> {
        let tree = self.tree.read();
        let index = locate(&tree, path)?;
        let key = KeyPair::load(&tree.dir_of(&self.root_dir, index).join(KEY_FILE))?;
        Ok(Export::pem(
            key.public_key_pem()?,
            format!("{}.pub", tree.node(index).id()),
        ))
    }

    /// The PKCS#8 private key at `path`, re-wrapped in a fresh PEM block.
    ///
    /// The DER bytes on disk are passed through untouched once they are
    /// known to hold an RSA key.
    pub fn export_private_key_pem(&self, path: &str) -> Result<Export> {
        let tree = self.tree.read();
        let index = locate(&tree, path)?;
        let key_path = tree.dir_of(&self.root_dir, index).join(KEY_FILE);
        let bytes = std::fs::read(&key_path).map_err(|e| CertyError::KeyUnreadable {
            path: key_path.clone(),
            message: e.to_string(),
        })?;
        let der = pem_utils::pem_to_der(&bytes, PRIVATE_KEY).ok_or_else(|| {
            CertyError::MalformedKey("file is not a PKCS#8 private key".to_string())
        })?;
        KeyPair::import_from_pkcs8_der(&der)?;
        Ok(Export::pem(
            pem_utils::der_to_pem(&der, PRIVATE_KEY),
            format!("{}.key", tree.node(index).id()),
        ))
    }

    /// A password-protected PKCS#12 bundle holding the certificate at `path`,
    /// its private key and its ancestors.
    ///
    /// Bags are encrypted with PBES2 (PBKDF2-HMAC-SHA256, AES-256-CBC) and the
    /// bundle is integrity-protected with an HMAC-SHA256 MAC.
    pub fn export_pkcs12(&self, path: &str, password: &str) -> Result<Export> {
        let tree = self.tree.read();
        let index = locate(&tree, path)?;
        let node = tree.node(index);
        let key = KeyPair::load(&tree.dir_of(&self.root_dir, index).join(KEY_FILE))?;

        // The key's own certificate leads; its ancestors follow root first.
        let mut ancestors = tree.chain(index);
        ancestors.pop();
        let chain = std::iter::once(index)
            .chain(ancestors)
            .map(|i| p12_keystore::Certificate::from_der(tree.node(i).certificate().to_der()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(pkcs12_error)?;
        let key_der = key.to_pkcs8_der()?;
        let local_key_id = Sha256::digest(node.certificate().to_der());
        let key_chain = PrivateKeyChain::new(&key_der, local_key_id.as_slice(), chain);

        let mut keystore = KeyStore::new();
        keystore.add_entry(
            &node.certificate().subject().common_name,
            KeyStoreEntry::PrivateKeyChain(key_chain),
        );
        let bytes = keystore
            .writer(password)
            .encryption_algorithm(EncryptionAlgorithm::PbeWithHmacSha256AndAes256)
            .mac_algorithm(MacAlgorithm::HmacSha256)
            .write()
            .map_err(pkcs12_error)?;

        Ok(Export {
            bytes,
            content_type: PKCS12_CONTENT_TYPE,
            file_name: format!("{}.p12", node.id()),
        })
    }
}

fn pkcs12_error(e: p12_keystore::error::Error) -> CertyError {
    CertyError::EncodingError(format!("unable to build PKCS#12 bundle: {e}"))
}
