// ABOUTME: Builds gzip-compressed tar archives for copying files into containers.
// ABOUTME: One regular-file entry per archive, path relative to the extraction root.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::io;

/// Build a gzip tar holding a single file at `path`.
///
/// `path` is absolute inside the container; the archive stores it relative
/// so extracting at `/` recreates it there.
pub fn single_file(path: &str, content: &[u8], mode: u32) -> io::Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(mode);
    header.set_entry_type(tar::EntryType::Regular);
    header.set_cksum();

    builder.append_data(&mut header, path.trim_start_matches('/'), content)?;

    builder.into_inner()?.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn entries(archive: &[u8]) -> Vec<(String, u32, Vec<u8>)> {
        let mut archive = tar::Archive::new(GzDecoder::new(archive));
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let path = entry.path().unwrap().to_string_lossy().into_owned();
                let mode = entry.header().mode().unwrap();
                let mut content = Vec::new();
                entry.read_to_end(&mut content).unwrap();
                (path, mode, content)
            })
            .collect()
    }

    #[test]
    fn archive_contains_exactly_one_entry() {
        let archive = single_file(
            "/etc/containerd/certs.d/docker.io/hosts.toml",
            b"[host]\n",
            0o644,
        )
        .unwrap();

        let entries = entries(&archive);
        assert_eq!(entries.len(), 1);

        let (path, mode, content) = &entries[0];
        assert_eq!(path, "etc/containerd/certs.d/docker.io/hosts.toml");
        assert_eq!(*mode, 0o644);
        assert_eq!(content, b"[host]\n");
    }

    #[test]
    fn empty_content_is_allowed() {
        let archive = single_file("/tmp/empty", b"", 0o600).unwrap();
        let entries = entries(&archive);
        assert_eq!(entries[0].0, "tmp/empty");
        assert!(entries[0].2.is_empty());
    }

    #[test]
    fn archive_is_gzip_compressed() {
        let archive = single_file("/a", b"x", 0o644).unwrap();
        assert_eq!(&archive[..2], &[0x1f, 0x8b]);
    }
}
