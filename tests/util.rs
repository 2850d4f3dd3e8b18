#![allow(dead_code)]

use std::path::Path;

use certy::cert::params::CreateParams;
use certy::config::StoreConfig;
use certy::store::Store;

/// Small keys keep the tests fast; the store default is 2048 bits.
pub const TEST_KEY_BITS: usize = 1024;

pub fn config(root_dir: &Path) -> StoreConfig {
    StoreConfig::builder()
        .root_dir(root_dir)
        .key_bits(TEST_KEY_BITS)
        .build()
}

pub fn open_store(root_dir: &Path) -> Store {
    Store::open(config(root_dir)).expect("Failed to open store")
}

pub fn params(common_name: &str, validity: &str) -> CreateParams {
    CreateParams::builder()
        .common_name(common_name)
        .organization("Crab widgits SE")
        .validity(validity)
        .build()
}

/// Creates root → intermediate → leaf and returns the three paths.
pub fn create_hierarchy(store: &Store) -> (String, String, String) {
    let root = store.create("", &params("Root CA", "10y")).unwrap();
    let intermediate = store
        .create(&root, &params("Intermediate CA", "5y"))
        .unwrap();
    let leaf = store
        .create(&intermediate, &params("client.myca.local", "30d"))
        .unwrap();
    (root, intermediate, leaf)
}

pub fn pem_blocks(bytes: &[u8]) -> Vec<pem::Pem> {
    pem::parse_many(bytes).expect("Failed to parse PEM")
}

/// Names of the subdirectories of `dir`, sorted.
pub fn subdirectories(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().unwrap().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
