//! Host file-type tagging is platform-specific (e.g. a ProDOS/GS-OS file
//! type byte) and out of core scope. This is the seam a platform-specific
//! build would replace; it currently only validates the path exists.

use std::io;
use std::path::Path;

pub fn set_file_type(path: &Path, _tag: &str) -> io::Result<()> {
    if !path.exists() {
        return Err(io::Error::new(io::ErrorKind::NotFound, path.display().to_string()));
    }
    Ok(())
}
