use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::UNIX_EPOCH;

const BLOCK: usize = 4096;

/// Prefix marking a file whose bytes could not be read at capture time.
/// Hashes carrying it are never verified.
pub const UNREADABLE_PREFIX: &str = "unreadable_";

/// Streaming SHA-256 over the full file content, hex encoded.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut f = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; BLOCK];
    loop {
        let n = f.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// SHA-256 over an in-memory buffer, hex encoded.
pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// The `unreadable_{size}_{mtime}` sentinel for a file whose content could
/// not be read. It still identifies the file state (size and mtime from
/// stat) without capturing any bytes.
pub fn unreadable_sentinel(path: &Path) -> String {
    let (size, mtime) = match std::fs::metadata(path) {
        Ok(md) => {
            let mtime = md
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
                .unwrap_or(0);
            (md.len(), mtime)
        }
        Err(_) => (0, 0),
    };
    format!("{UNREADABLE_PREFIX}{size}_{mtime}")
}

pub fn is_unreadable(hash: &str) -> bool {
    hash.starts_with(UNREADABLE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_match_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("a.txt");
        std::fs::write(&p, "hello").unwrap();
        // sha256("hello")
        let expect = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        assert_eq!(hash_file(&p).unwrap(), expect);
        assert_eq!(hash_bytes(b"hello"), expect);
    }

    #[test]
    fn streaming_matches_buffered_across_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("big.bin");
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&p, &data).unwrap();
        assert_eq!(hash_file(&p).unwrap(), hash_bytes(&data));
    }

    #[test]
    fn sentinel_is_recognized() {
        assert!(is_unreadable("unreadable_512_1692823943"));
        assert!(!is_unreadable(
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        ));
    }

    #[test]
    fn sentinel_embeds_stat_fields() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("present.txt");
        std::fs::write(&p, "12345").unwrap();
        let h = unreadable_sentinel(&p);
        assert!(h.starts_with("unreadable_5_"));
        assert!(is_unreadable(&h));

        // Even a vanished file still produces a recognizable sentinel.
        assert!(is_unreadable(&unreadable_sentinel(
            &dir.path().join("gone.txt")
        )));
    }
}
