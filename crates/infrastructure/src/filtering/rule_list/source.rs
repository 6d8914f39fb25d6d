use dnsieve_domain::DomainError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Read a local rule list into `buf` (cleared first), failing once it
/// exceeds `max_size` bytes.
pub async fn read_file(
    name: &str,
    path: &Path,
    max_size: u64,
    buf: &mut Vec<u8>,
) -> Result<(), DomainError> {
    buf.clear();

    let fetch_err = |e: std::io::Error| DomainError::FilterFetch {
        filter: name.to_string(),
        reason: format!("{}: {}", path.display(), e),
    };

    let file = File::open(path).await.map_err(fetch_err)?;
    let len = file.metadata().await.map_err(fetch_err)?.len();
    if len > max_size {
        return Err(DomainError::FilterTooLarge {
            filter: name.to_string(),
            max_size,
        });
    }

    // The file may grow between metadata() and the read.
    file.take(max_size + 1)
        .read_to_end(buf)
        .await
        .map_err(fetch_err)?;
    if buf.len() as u64 > max_size {
        return Err(DomainError::FilterTooLarge {
            filter: name.to_string(),
            max_size,
        });
    }

    Ok(())
}

/// Where downloaded content for filter `id` is kept.
pub fn cache_path(cache_dir: &Path, id: u64) -> PathBuf {
    cache_dir.join(format!("{}.txt", id))
}

/// Persist downloaded content next to the other cached lists.
pub async fn write_cache(cache_dir: &Path, id: u64, content: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(cache_dir).await?;
    tokio::fs::write(cache_path(cache_dir, id), content).await
}

/// Hex SHA-256 of `content`.
pub fn checksum(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_read_file_within_limit() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ads.example\n").unwrap();

        let mut buf = b"stale".to_vec();
        read_file("local", file.path(), 1024, &mut buf).await.unwrap();
        assert_eq!(buf, b"ads.example\n");
    }

    #[tokio::test]
    async fn test_read_file_too_large() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[b'a'; 64]).unwrap();

        let mut buf = Vec::new();
        let err = read_file("local", file.path(), 16, &mut buf).await.unwrap_err();
        assert!(matches!(err, DomainError::FilterTooLarge { max_size: 16, .. }));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let mut buf = Vec::new();
        let err = read_file("gone", Path::new("/nonexistent/list.txt"), 16, &mut buf)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::FilterFetch { .. }));
    }

    #[test]
    fn test_checksum_is_hex_sha256() {
        assert_eq!(
            checksum(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_cache_path() {
        assert_eq!(
            cache_path(Path::new("/var/cache"), 42),
            PathBuf::from("/var/cache/42.txt")
        );
    }
}
