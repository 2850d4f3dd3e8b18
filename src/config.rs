use std::path::PathBuf;

use bon::Builder;

use crate::key::DEFAULT_RSA_BITS;

/// Configuration for a [`Store`](crate::store::Store).
///
/// # Fields
/// * `root_dir` - Directory holding one subdirectory per root certificate.
///   Created on open if missing.
/// * `key_bits` - RSA modulus size for new keys. Defaults to 2048.
///
/// ```
/// use certy::config::StoreConfig;
/// let config = StoreConfig::builder().root_dir("/var/lib/certy/certs").build();
/// assert_eq!(config.key_bits, 2048);
/// ```
#[derive(Clone, Debug, Builder)]
pub struct StoreConfig {
    #[builder(into)]
    pub root_dir: PathBuf,
    #[builder(default = DEFAULT_RSA_BITS)]
    pub key_bits: usize,
}
