//! # certy - A Small Pure Rust Certificate Authority
//!
//! certy issues, stores and exports X.509 certificates and their RSA private
//! keys. Certificates form a signing hierarchy (root → intermediate → leaf)
//! that is kept on disk as nested directories and mirrored in memory.
//!
//! ## On-disk Layout
//!
//! ```text
//! <root>/<id>/cert.pem          PEM CERTIFICATE
//! <root>/<id>/key.pem           PEM PRIVATE KEY (PKCS#8)
//! <root>/<id>/serial            next serial number, issuers only
//! <root>/<id>/<child id>/...    same shape, recursively
//! ```
//!
//! A node's `id` is the first 12 hex characters of the SHA-256 of its DER
//! certificate, and its path is the `/`-separated list of ids from its root.
//!
//! ## Key Features
//!
//! - **Crash-safe creation**: new nodes are built in a staging directory and
//!   renamed into place in a single step
//! - **Per-issuer serials**: each issuer keeps a durable counter
//! - **Best-effort loading**: a corrupt node only hides its own subtree
//! - **Exports**: certificate, chain, public key, private key and PKCS#12
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use certy::{cert::params::CreateParams, config::StoreConfig, store::Store};
//!
//! # fn main() -> Result<(), certy::error::CertyError> {
//! let store = Store::open(StoreConfig::builder().root_dir("certs").build())?;
//!
//! let root = store.create(
//!     "",
//!     &CreateParams::builder()
//!         .common_name("Root CA")
//!         .organization("Example Corp")
//!         .validity("10y")
//!         .build(),
//! )?;
//!
//! let leaf = store.create(
//!     &root,
//!     &CreateParams::builder()
//!         .common_name("client.example.com")
//!         .organization("Example Corp")
//!         .validity("30d")
//!         .build(),
//! )?;
//!
//! let chain = store.export_chain_pem(&leaf)?;
//! println!("{}", String::from_utf8_lossy(&chain.bytes));
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`error::CertyError`]:
//!
//! ```rust
//! use certy::{duration::parse_duration, error::CertyError};
//!
//! match parse_duration("10 years") {
//!     Err(CertyError::InvalidFormat(value)) => println!("bad validity {value}"),
//!     other => println!("{other:?}"),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`store`]: path lookup, creation and exports
//! - [`tree`]: in-memory hierarchy and the directory loader
//! - [`serial`]: per-issuer serial counters
//! - [`duration`]: validity strings such as `"90d"`
//! - [`cert`], [`issuer`], [`key`], [`tbs_certificate`]: certificate and key
//!   handling on top of the RustCrypto crates
//! - [`error`]: error type

pub mod cert;
pub mod config;
pub mod duration;
pub mod error;
mod fs_util;
pub mod issuer;
pub mod key;
pub mod pem_utils;
pub mod serial;
pub mod store;
pub mod tbs_certificate;
pub mod tree;
