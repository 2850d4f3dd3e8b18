//! In-memory signing hierarchy and the on-disk loader that rebuilds it.
//!
//! Nodes live in an arena owned by [`CertTree`]. Children are owned top-down
//! through the arena; the parent link is a plain [`NodeIndex`] used for
//! chain walks.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::cert::Certificate;
use crate::error::{CertyError, Result};
use crate::pem_utils::{self, CERTIFICATE};

/// Certificate file inside a node directory.
pub const CERT_FILE: &str = "cert.pem";

/// Private key file inside a node directory.
pub const KEY_FILE: &str = "key.pem";

/// Prefix of the directories new nodes are assembled in before being renamed.
pub const STAGING_PREFIX: &str = "temp-";

/// Separator between ids in a certificate path.
pub const PATH_SEPARATOR: char = '/';

/// Position of a node in the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIndex(usize);

/// One signed certificate in the hierarchy.
#[derive(Debug, Clone)]
pub struct CertNode {
    id: String,
    fingerprint: String,
    certificate: Certificate,
    parent: Option<NodeIndex>,
    children: HashMap<String, NodeIndex>,
}

impl CertNode {
    fn new(certificate: Certificate, parent: Option<NodeIndex>) -> Self {
        CertNode {
            id: certificate.id(),
            fingerprint: certificate.fingerprint(),
            certificate,
            parent,
            children: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn children(&self) -> &HashMap<String, NodeIndex> {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Forest of certificate nodes keyed by root id.
#[derive(Debug, Clone, Default)]
pub struct CertTree {
    nodes: Vec<CertNode>,
    roots: HashMap<String, NodeIndex>,
}

impl CertTree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: NodeIndex) -> &CertNode {
        &self.nodes[index.0]
    }

    pub fn roots(&self) -> &HashMap<String, NodeIndex> {
        &self.roots
    }

    /// Adds `certificate` under `parent`, or as a root when `parent` is `None`.
    ///
    /// Callers must only insert nodes whose directory already exists.
    pub fn insert(&mut self, parent: Option<NodeIndex>, certificate: Certificate) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        let node = CertNode::new(certificate, parent);
        let id = node.id.clone();
        self.nodes.push(node);
        match parent {
            Some(parent) => self.nodes[parent.0].children.insert(id, index),
            None => self.roots.insert(id, index),
        };
        index
    }

    /// Walks `path` from the root map through successive children maps.
    ///
    /// The empty path names no certificate.
    pub fn lookup(&self, path: &str) -> Option<NodeIndex> {
        if path.is_empty() {
            return None;
        }
        let mut segments = path.split(PATH_SEPARATOR);
        let mut current = *self.roots.get(segments.next()?)?;
        for segment in segments {
            current = *self.node(current).children.get(segment)?;
        }
        Some(current)
    }

    /// The node followed by each of its ancestors, ending at the root.
    pub fn ancestry(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(Some(index), |i| self.node(*i).parent)
    }

    /// The chain from the root down to and including `index`.
    pub fn chain(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut chain: Vec<NodeIndex> = self.ancestry(index).collect();
        chain.reverse();
        chain
    }

    /// The `/`-separated path of ids addressing `index`.
    pub fn path_of(&self, index: NodeIndex) -> String {
        let mut path = String::new();
        for i in self.chain(index) {
            if !path.is_empty() {
                path.push(PATH_SEPARATOR);
            }
            path.push_str(&self.node(i).id);
        }
        path
    }

    /// The directory holding `index` below the certificate root.
    pub fn dir_of(&self, root_dir: &Path, index: NodeIndex) -> PathBuf {
        self.chain(index)
            .into_iter()
            .fold(root_dir.to_path_buf(), |dir, i| dir.join(&self.node(i).id))
    }
}

/// A node directory that could not be loaded.
///
/// The directory and everything below it are missing from the tree.
#[derive(Debug)]
pub struct LoadError {
    pub dir: PathBuf,
    pub error: CertyError,
}

/// Result of scanning a certificate root.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub tree: CertTree,
    pub errors: Vec<LoadError>,
}

/// Reads and parses `cert.pem` from a node directory.
pub fn load_certificate(dir: &Path) -> Result<Certificate> {
    let path = dir.join(CERT_FILE);
    let bytes = std::fs::read(&path).map_err(|e| CertyError::io(&path, e))?;
    let der = pem_utils::pem_to_der(&bytes, CERTIFICATE)
        .ok_or_else(|| CertyError::NotACertificate(path.clone()))?;
    Certificate::from_der(der).map_err(|e| CertyError::MalformedCertificate {
        path,
        message: e.to_string(),
    })
}

/// Loads a node directory that is expected to be named after its certificate.
fn load_node(dir: &Path) -> Result<Certificate> {
    let certificate = load_certificate(dir)?;
    let id = certificate.id();
    if dir.file_name().and_then(|n| n.to_str()) != Some(id.as_str()) {
        return Err(CertyError::DirectoryMismatch {
            path: dir.to_path_buf(),
            id,
        });
    }
    Ok(certificate)
}

/// Sorted subdirectories of `dir`, skipping interrupted creations.
fn node_dirs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with(STAGING_PREFIX) {
            debug!(dir = %entry.path().display(), "skipping leftover staging directory");
            continue;
        }
        dirs.push(entry.path());
    }
    dirs.sort();
    Ok(dirs)
}

/// Rebuilds the certificate forest below `root_dir`.
///
/// A missing `root_dir` is an empty forest. Failing to list `root_dir` itself
/// is an error; any node that fails to load is skipped together with its
/// subtree and reported in [`LoadReport::errors`].
pub fn load_tree(root_dir: &Path) -> Result<LoadReport> {
    let mut report = LoadReport::default();

    let top = match node_dirs(root_dir) {
        Ok(dirs) => dirs,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(report),
        Err(e) => return Err(CertyError::io(root_dir, e)),
    };

    let mut pending: Vec<(PathBuf, Option<NodeIndex>)> =
        top.into_iter().rev().map(|dir| (dir, None)).collect();

    while let Some((dir, parent)) = pending.pop() {
        let certificate = match load_node(&dir) {
            Ok(certificate) => certificate,
            Err(error) => {
                warn!(dir = %dir.display(), %error, "skipping certificate directory");
                report.errors.push(LoadError { dir, error });
                continue;
            }
        };
        let index = report.tree.insert(parent, certificate);

        match node_dirs(&dir) {
            Ok(children) => {
                pending.extend(children.into_iter().rev().map(|child| (child, Some(index))));
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "unable to list child certificates");
                report.errors.push(LoadError {
                    error: CertyError::io(&dir, e),
                    dir,
                });
            }
        }
    }

    Ok(report)
}
