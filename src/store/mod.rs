//! The hierarchical certificate store.
//!
//! Directory layout below the configured root:
//!
//! ```text
//! <root>/<id>/cert.pem          PEM CERTIFICATE
//! <root>/<id>/key.pem           PEM PRIVATE KEY (PKCS#8)
//! <root>/<id>/serial            next serial, issuers only
//! <root>/<id>/<child id>/...    same shape, recursively
//! ```
//!
//! One reader/writer lock guards the in-memory tree and every disk write.
//! Reads share it; [`Store::create`] holds it exclusively from start to
//! finish, key generation included.

mod export;

pub use export::{Export, PEM_CONTENT_TYPE, PKCS12_CONTENT_TYPE};

use std::path::PathBuf;

use parking_lot::RwLock;
use tracing::{error, info};

use crate::cert::params::{CreateParams, Validity};
use crate::cert::{Certificate, CertificateSummary};
use crate::config::StoreConfig;
use crate::duration::parse_duration;
use crate::error::{CertyError, Result};
use crate::fs_util;
use crate::issuer::{CertificateSigner, CertificateTemplate, RsaSha256Signer};
use crate::key::KeyPair;
use crate::serial::{self, ROOT_SERIAL};
use crate::tree::{
    self, CERT_FILE, CertTree, KEY_FILE, LoadError, LoadReport, NodeIndex, STAGING_PREFIX,
};

/// Short reference to a certificate, as used in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertRef {
    pub id: String,
    pub path: String,
    pub summary: CertificateSummary,
}

/// A resolved node together with its directory on disk.
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    pub path: String,
    pub id: String,
    pub fingerprint: String,
    pub certificate: Certificate,
    pub dir: PathBuf,
}

/// Everything shown about one certificate.
///
/// `parents` runs from the root down to the direct issuer; `children` are
/// sorted by common name.
#[derive(Debug, Clone)]
pub struct CertificateDetails {
    pub path: String,
    pub id: String,
    pub fingerprint: String,
    pub certificate: Certificate,
    pub summary: CertificateSummary,
    pub parents: Vec<CertRef>,
    pub children: Vec<CertRef>,
}

/// Path-addressed store of certificates and keys.
pub struct Store {
    root_dir: PathBuf,
    key_bits: usize,
    signer: Box<dyn CertificateSigner>,
    tree: RwLock<CertTree>,
    load_errors: Vec<LoadError>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("root_dir", &self.root_dir)
            .field("key_bits", &self.key_bits)
            .field("certificates", &self.tree.read().len())
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Opens the store, loading every certificate below `config.root_dir`.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Self::with_signer(config, RsaSha256Signer)
    }

    /// Opens the store with a custom signing primitive.
    pub fn with_signer(config: StoreConfig, signer: impl CertificateSigner + 'static) -> Result<Self> {
        std::fs::create_dir_all(&config.root_dir)
            .map_err(|e| CertyError::io(&config.root_dir, e))?;
        let LoadReport { tree, errors } = tree::load_tree(&config.root_dir)?;
        info!(
            root_dir = %config.root_dir.display(),
            certificates = tree.len(),
            skipped = errors.len(),
            "opened certificate store"
        );
        Ok(Store {
            root_dir: config.root_dir,
            key_bits: config.key_bits,
            signer: Box::new(signer),
            tree: RwLock::new(tree),
            load_errors: errors,
        })
    }

    /// Directories that were skipped when the store was opened.
    pub fn load_errors(&self) -> &[LoadError] {
        &self.load_errors
    }

    /// Root certificates, sorted by common name and then id.
    pub fn list_roots(&self) -> Vec<CertRef> {
        let tree = self.tree.read();
        sorted_refs(&tree, tree.roots().values().copied())
    }

    /// Looks up the certificate at `path`.
    pub fn resolve(&self, path: &str) -> Result<ResolvedNode> {
        let tree = self.tree.read();
        let index = locate(&tree, path)?;
        let node = tree.node(index);
        Ok(ResolvedNode {
            path: path.to_string(),
            id: node.id().to_string(),
            fingerprint: node.fingerprint().to_string(),
            certificate: node.certificate().clone(),
            dir: tree.dir_of(&self.root_dir, index),
        })
    }

    /// The certificate at `path` with its ancestors and children.
    pub fn certificate(&self, path: &str) -> Result<CertificateDetails> {
        let tree = self.tree.read();
        let index = locate(&tree, path)?;
        let node = tree.node(index);

        let mut chain = tree.chain(index);
        chain.pop();
        let parents = chain.into_iter().map(|i| cert_ref(&tree, i)).collect();
        let children = sorted_refs(&tree, node.children().values().copied());

        Ok(CertificateDetails {
            path: path.to_string(),
            id: node.id().to_string(),
            fingerprint: node.fingerprint().to_string(),
            certificate: node.certificate().clone(),
            summary: node.certificate().summary(),
            parents,
            children,
        })
    }

    /// Creates a certificate and key below `parent_path`, or a new self-signed
    /// root when `parent_path` is empty. Returns the path of the new node.
    ///
    /// The node is assembled in a staging directory next to its final
    /// location and renamed into place as the last fallible step, so a failure
    /// before that leaves neither disk nor memory changed (apart from an
    /// issuer's serial counter). The tree only learns about the node once its
    /// directory exists.
    pub fn create(&self, parent_path: &str, params: &CreateParams) -> Result<String> {
        let mut tree = self.tree.write();

        let (parent, parent_dir) = if parent_path.is_empty() {
            (None, self.root_dir.clone())
        } else {
            let index = locate(&tree, parent_path)?;
            (Some(index), tree.dir_of(&self.root_dir, index))
        };

        // Removed on drop; after the rename below there is nothing left to remove.
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&parent_dir)
            .map_err(|e| CertyError::io(&parent_dir, e))?;

        let lifetime = parse_duration(&params.validity)?;

        let key = KeyPair::generate_rsa(self.key_bits)?;
        key.save(&staging.path().join(KEY_FILE))?;

        let issuer_key = match parent {
            Some(_) => Some(KeyPair::load(&parent_dir.join(KEY_FILE))?),
            None => None,
        };
        let signing_key = issuer_key.as_ref().unwrap_or(&key);

        let serial_number = match parent {
            Some(_) => serial::allocate_next_serial(&parent_dir)?,
            None => ROOT_SERIAL,
        };

        let template = CertificateTemplate {
            subject: params.subject(),
            serial_number,
            validity: Validity::starting_now(lifetime)?,
            is_ca: parent.is_none(),
        };
        let issuer = parent.map(|index| tree.node(index).certificate());
        let signed = self.signer.sign(
            &template,
            issuer,
            key.public_key(),
            signing_key.private_key(),
        )?;
        fs_util::write_private(&staging.path().join(CERT_FILE), signed.to_pem().as_bytes())?;

        let certificate = tree::load_certificate(staging.path())?;
        let id = certificate.id();
        let final_dir = parent_dir.join(&id);

        if let Err(source) = std::fs::rename(staging.path(), &final_dir) {
            error!(
                from = %staging.path().display(),
                to = %final_dir.display(),
                error = %source,
                "failed to move new certificate into place"
            );
            return Err(CertyError::Fatal {
                from: staging.path().to_path_buf(),
                to: final_dir,
                source,
            });
        }

        let index = tree.insert(parent, certificate);
        let path = tree.path_of(index);
        info!(
            path = %path,
            common_name = %params.common_name,
            serial = serial_number,
            "created certificate"
        );
        Ok(path)
    }
}

fn locate(tree: &CertTree, path: &str) -> Result<NodeIndex> {
    tree.lookup(path)
        .ok_or_else(|| CertyError::CertificateNotFound(path.to_string()))
}

fn cert_ref(tree: &CertTree, index: NodeIndex) -> CertRef {
    let node = tree.node(index);
    CertRef {
        id: node.id().to_string(),
        path: tree.path_of(index),
        summary: node.certificate().summary(),
    }
}

fn sorted_refs(tree: &CertTree, indices: impl Iterator<Item = NodeIndex>) -> Vec<CertRef> {
    let mut refs: Vec<CertRef> = indices.map(|i| cert_ref(tree, i)).collect();
    refs.sort_by(|a, b| {
        a.summary
            .subject
            .common_name
            .cmp(&b.summary.subject.common_name)
            .then_with(|| a.id.cmp(&b.id))
    });
    refs
}
