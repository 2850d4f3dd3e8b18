use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{CertyError, Result};
use crate::fs_util;

/// Name of the per-issuer counter file.
pub const SERIAL_FILE: &str = "serial";

/// Serial number of every self-signed root.
pub const ROOT_SERIAL: u64 = 1;

/// Allocates the next serial number for certificates signed by the issuer
/// stored in `issuer_dir`.
///
/// A missing counter starts at zero. An unparsable counter is also treated
/// as zero, so a hand-edited file can lead to serials being reused.
///
/// There is no locking here: callers must hold the store's write lock.
pub fn allocate_next_serial(issuer_dir: &Path) -> Result<u64> {
    let path = issuer_dir.join(SERIAL_FILE);
    let current = match std::fs::read_to_string(&path) {
        Ok(contents) => contents.trim().parse::<u64>().unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "unparsable serial counter, restarting at 0");
            0
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => 0,
        Err(e) => return Err(CertyError::io(&path, e)),
    };

    let next = current
        .checked_add(1)
        .ok_or_else(|| CertyError::SerialExhausted(issuer_dir.to_path_buf()))?;
    fs_util::write_private(&path, next.to_string().as_bytes())?;
    debug!(issuer = %issuer_dir.display(), serial = next, "allocated serial");
    Ok(next)
}
