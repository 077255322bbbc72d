//! POSIX tar archive construction for file injection (spec §4.2).

use std::time::{SystemTime, UNIX_EPOCH};

use crucible_core::File;

/// Builds a USTAR archive with one entry per file, named exactly as
/// `file.name`, mode `0644`, owner root, mtime set to the current time.
///
/// Grounded on `runbox/docker/utils.py::create_tarball`.
pub fn build_tarball(files: &[File]) -> std::io::Result<Vec<u8>> {
    let mtime = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut builder = tar::Builder::new(Vec::new());
    for file in files {
        let content = file.content_bytes();
        let mut header = tar::Header::new_ustar();
        header.set_path(&file.name)?;
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(mtime);
        header.set_uid(0);
        header.set_gid(0);
        header.set_cksum();
        builder.append(&header, content.as_slice())?;
    }
    builder.into_inner()
}

#[cfg(test)]
#[path = "packager_tests.rs"]
mod tests;
