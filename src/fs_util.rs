use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::{CertyError, Result};

/// Create or truncate `path` and write `contents` with owner-only permissions.
pub(crate) fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(|e| CertyError::io(path, e))?;
    file.write_all(contents)
        .map_err(|e| CertyError::io(path, e))
}
