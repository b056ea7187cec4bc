//! Write-then-rename file replacement

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Replaces `path` with `contents` via a sibling temp file and a rename
///
/// Missing parent directories are created. Readers never observe a partially
/// written file; concurrent writers are not synchronized.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;

        let mut writer = BufWriter::new(&file);
        writer.write_all(contents)?;
        writer.flush()?;
        file.sync_all()?;
    }

    fs::rename(&temp_path, path)
}
